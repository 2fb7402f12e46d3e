use std::error::Error;

use wamon::{merge_package_units, parse, Interpreter, Scanner, TypeChecker};

fn parse_unit(script: &str) -> Result<wamon::PackageUnit, Box<dyn Error>> {
    let tokens = Scanner::new().scan(script)?;
    Ok(parse(&tokens)?)
}

#[test]
fn cross_package_references() -> Result<(), Box<dyn Error>> {
    let base = parse_unit(
        r#"
        package base;

        let zero : int = (0);

        func answer() -> int {
          return 42;
        }
        "#,
    )?;
    let app = parse_unit(
        r#"
        package app;

        import base;

        func compute() -> int {
          return call base::answer:() + base::zero;
        }
        "#,
    )?;

    let pu = merge_package_units(vec![base, app])?;
    TypeChecker::new(&pu).check_all()?;
    let mut ip = Interpreter::new(pu)?;

    let ret = ip.call_function_by_name("app$compute", vec![])?;
    assert_eq!(ret.borrow().int_value()?, 42);
    assert_eq!(
        ip.find_variable_by_id("base$zero")?.borrow().int_value()?,
        0
    );
    Ok(())
}

#[test]
fn global_initialisation_follows_unit_order() -> Result<(), Box<dyn Error>> {
    let base = parse_unit(
        r#"
        package base;
        let start : int = (7);
        "#,
    )?;
    let app = parse_unit(
        r#"
        package app;
        import base;
        let doubled : int = (base::start + base::start);
        "#,
    )?;
    let pu = merge_package_units(vec![base, app])?;
    TypeChecker::new(&pu).check_all()?;
    let ip = Interpreter::new(pu)?;
    assert_eq!(
        ip.find_variable_by_id("app$doubled")?.borrow().int_value()?,
        14
    );
    Ok(())
}

#[test]
fn merge_rejects_colliding_names() -> Result<(), Box<dyn Error>> {
    let first = parse_unit(
        r#"
        package dup;
        func f() -> int {
          return 1;
        }
        "#,
    )?;
    let second = parse_unit(
        r#"
        package dup;
        func f() -> int {
          return 2;
        }
        "#,
    )?;
    assert!(merge_package_units(vec![first, second]).is_err());
    Ok(())
}

#[test]
fn merge_rejects_colliding_globals() -> Result<(), Box<dyn Error>> {
    let first = parse_unit(
        r#"
        package dup;
        let g : int = (1);
        "#,
    )?;
    let second = parse_unit(
        r#"
        package dup;
        let g : int = (2);
        "#,
    )?;
    assert!(merge_package_units(vec![first, second]).is_err());
    Ok(())
}

#[test]
fn operator_overloads_keep_their_synthetic_names() -> Result<(), Box<dyn Error>> {
    let unit = parse_unit(
        r#"
        package main;

        struct vec {
          int x;
        }

        operator + (vec a, vec b) -> vec {
          return new vec(a.x + b.x);
        }
        "#,
    )?;
    let pu = merge_package_units(vec![unit])?;
    assert!(pu.find_function("__op_+_main$vec-main$vec-").is_some());
    Ok(())
}
