//! Compile a (model, flavor, params) request from the command line and
//! print the resulting SQL, bound values, and title.  Optionally execute
//! it and print the matching ids.
use getopts::Options;
use mo_query::db::DatabaseConnection;
use mo_query::{Flavor, Model, PgStore, Query};
use std::env;
use std::process;

fn usage(opts: &Options) -> ! {
    let brief = "Usage: mo-compile-query --model MODEL --flavor FLAVOR [--params JSON]";
    eprintln!("{}", opts.usage(brief));
    process::exit(1);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut opts = Options::new();
    opts.optopt("m", "model", "Model to query, e.g. Observation", "MODEL");
    opts.optopt("f", "flavor", "Query flavor, e.g. by_user", "FLAVOR");
    opts.optopt("p", "params", "Query parameters as a JSON object", "JSON");
    opts.optflag("x", "execute", "Execute the query and print result ids");
    opts.optflag("h", "help", "Print help");
    DatabaseConnection::append_options(&mut opts);

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error parsing options: {e}");
            usage(&opts);
        }
    };

    if matches.opt_present("help") {
        usage(&opts);
    }

    let model = match matches.opt_str("model").as_deref().and_then(Model::parse) {
        Some(m) => m,
        None => {
            eprintln!("A valid --model is required");
            usage(&opts);
        }
    };

    let flavor = match matches.opt_str("flavor").as_deref().and_then(Flavor::parse) {
        Some(f) => f,
        None => {
            eprintln!("A valid --flavor is required");
            usage(&opts);
        }
    };

    let params = match matches.opt_str("params") {
        Some(p) => match json::parse(&p) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Cannot parse --params JSON: {e}");
                process::exit(1);
            }
        },
        None => json::JsonValue::new_object(),
    };

    let mut db = DatabaseConnection::new_from_options(&matches);
    if let Err(e) = db.connect() {
        eprintln!("{e}");
        process::exit(1);
    }
    let mut store = PgStore::new(db.into_shared());

    let query = match Query::build(model, flavor, &params, &mut store) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Cannot build query: {e}");
            process::exit(1);
        }
    };

    match query.sql() {
        Ok(sql) => println!("{sql}"),
        Err(e) => {
            eprintln!("Cannot render query: {e}");
            process::exit(1);
        }
    }

    for (idx, bind) in query.binds().iter().enumerate() {
        println!("  ${} = {bind}", idx + 1);
    }

    println!("Title: {}", query.title().text());

    if query.executor().is_some() {
        println!("Note: query carries an alternate execution strategy");
    }

    if matches.opt_present("execute") {
        match query.result_ids(&mut store) {
            Ok(ids) => {
                println!(
                    "{} result(s): {}",
                    ids.len(),
                    ids.iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                );
            }
            Err(e) => {
                eprintln!("Execution failed: {e}");
                process::exit(1);
            }
        }
    }
}
