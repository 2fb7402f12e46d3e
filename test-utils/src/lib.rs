use std::error::Error;

use wamon::{
    merge_package_units, parse, Interpreter, PackageUnit, Scanner, TypeChecker, TypeError,
};

/// Scan, parse and merge a single script into the canonical package unit.
pub fn build_package_unit(script: &str) -> Result<PackageUnit, Box<dyn Error>> {
    let tokens = Scanner::new().scan(script)?;
    let pu = parse(&tokens)?;
    Ok(merge_package_units(vec![pu])?)
}

/// Run the whole pipeline and return a ready interpreter.
pub fn build_interpreter(script: &str) -> Result<Interpreter, Box<dyn Error>> {
    let pu = build_package_unit(script)?;
    TypeChecker::new(&pu).check_all()?;
    Ok(Interpreter::new(pu)?)
}

/// The script must parse but fail semantic analysis; the error is returned
/// for inspection.
pub fn expect_type_check_error(script: &str) -> TypeError {
    let pu = build_package_unit(script).expect("script should parse");
    TypeChecker::new(&pu)
        .check_all()
        .expect_err("type check should fail")
}
