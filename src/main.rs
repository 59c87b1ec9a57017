use clap::Parser;
use inference_core::config::{self, EngineConfig};
use inference_core::driver::InferenceDriver;
use inference_core::element::ElementType;
use inference_core::store::memory::MemoryStore;
use inference_core::store::{GraphStore, TemplateElement, TemplateTriple};

/// inference-demo - runs a forward-chaining inference pass over a tiny
/// in-memory knowledge base
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Capacity of the searcher's positive-membership LRU cache
    #[arg(long, default_value_t = 64)]
    lru_capacity: usize,

    /// Generate GENERATE_ALL_FORMULAS instead of GENERATE_UNIQUE_FORMULAS
    #[arg(long)]
    generate_all: bool,

    /// Fill the output structure with searched matches too, not just
    /// newly-generated ones
    #[arg(long)]
    fill_searched_and_generated: bool,

    /// Skip building a solution tree
    #[arg(long)]
    no_solution_tree: bool,
}

impl From<Cli> for config::CliConfig {
    fn from(cli: Cli) -> Self {
        config::CliConfig {
            lru_capacity: cli.lru_capacity,
            generate_unique_formulas: !cli.generate_all,
            fill_generated_only: !cli.fill_searched_and_generated,
            generate_solution_tree: !cli.no_solution_tree,
            search_in_kb_when_generating: true,
            replacements_all: true,
        }
    }
}

/// Seeds a tiny knowledge base: a `candidate` fact already asserted for each
/// argument, one already-classified animal unrelated to the arguments (so the
/// conclusion atom's "search without replacements" probe has something to
/// join against rather than hitting the empty-KB degenerate case), and one
/// rule "every candidate is an animal" whose conclusion the driver generates
/// for `dog` and `cat`.
fn seed(store: &mut MemoryStore) -> (inference_core::element::ElementId, inference_core::element::ElementId, inference_core::element::ElementId) {
    let candidate_class = store.create_node(ElementType::NODE | ElementType::CONST);
    let animal_class = store.create_node(ElementType::NODE | ElementType::CONST);
    let is_a = store.create_node(ElementType::NODE | ElementType::CONST);
    store.set_idtf(candidate_class, "concept_candidate");
    store.set_idtf(animal_class, "concept_animal");
    store.set_idtf(is_a, "nrel_is_a");

    let dog = store.create_node(ElementType::NODE | ElementType::CONST);
    let cat = store.create_node(ElementType::NODE | ElementType::CONST);
    let bird = store.create_node(ElementType::NODE | ElementType::CONST);
    store.set_idtf(dog, "concept_dog");
    store.set_idtf(cat, "concept_cat");
    store.set_idtf(bird, "concept_bird");

    store.assert_fact(dog, is_a, candidate_class);
    store.assert_fact(cat, is_a, candidate_class);
    store.assert_fact(bird, is_a, animal_class);

    let x = store.new_variable();
    let premise = store.define_atomic_formula(vec![TemplateTriple {
        source: TemplateElement::Var(x),
        connector: TemplateElement::Const(is_a),
        target: TemplateElement::Const(candidate_class),
    }]);
    let conclusion = store.define_atomic_formula(vec![TemplateTriple {
        source: TemplateElement::Var(x),
        connector: TemplateElement::Const(is_a),
        target: TemplateElement::Const(animal_class),
    }]);

    let rule_formula = store.define_implication(premise, conclusion);
    let rule = store.define_rule(rule_formula);
    let rule_set = store.define_rule_priority_list(vec![vec![rule]]);
    let arguments = store.define_argument_set(vec![dog, cat]);

    (conclusion, rule_set, arguments)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let cli = Cli::parse();
    println!("\ninference-demo v{}\n", env!("CARGO_PKG_VERSION"));

    let cli_config: config::CliConfig = cli.into();
    let engine_config = match EngineConfig::from_cli(cli_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let mut store = MemoryStore::new();
    let (target, formulas_set, arguments) = seed(&mut store);

    let driver = InferenceDriver::new(engine_config.lru_capacity)
        .with_generation_type(engine_config.generation_type())
        .with_filling_type(engine_config.filling_type());

    match driver.apply_inference(&mut store, target, formulas_set, arguments, None, engine_config.flow()) {
        Ok(solution) => println!("inference finished, solution element = {:?}", solution),
        Err(e) => {
            eprintln!("inference error: {}", e);
            std::process::exit(1);
        }
    }
}
