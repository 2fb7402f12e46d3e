//! The wamon script runner: scan, parse, merge, check, interpret.

mod cli;

use std::{error::Error, fs};

use log::{error, info};

use cli::Cli;
use wamon::{merge_package_units, parse, Interpreter, Scanner, TypeChecker};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into())?;

    let script = fs::read_to_string(&args.file)?;

    let tokens = Scanner::new().scan(&script)?;
    if args.dump_tokens {
        info!("tokens:\n{tokens:#?}");
    }

    let pu = parse(&tokens)?;
    info!("parsed package '{}'", pu.name());
    let pu = merge_package_units(vec![pu])?;

    if let Err(check_error) = TypeChecker::new(&pu).check_all() {
        error!("{check_error}");
        std::process::exit(-1);
    }

    let mut interpreter = match Interpreter::new(pu) {
        Ok(interpreter) => interpreter,
        Err(runtime_error) => {
            error!("{runtime_error}");
            std::process::exit(-1);
        }
    };

    if let Some(id) = &args.call {
        match interpreter.call_function_by_name(id, vec![]) {
            Ok(result) => println!("{}", result.borrow().to_json()),
            Err(runtime_error) => {
                error!("{runtime_error}");
                std::process::exit(-1);
            }
        }
    }

    Ok(())
}
