use std::error::Error;

use test_utils::build_interpreter;
use wamon::{new_ref, Variable};

#[test]
fn lambda_with_value_capture() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let v0 : int = 1;

        let v : f((int, int) -> int) = lambda [v0] (int a, int b) -> int { return a + b + v0; };
        "#,
    )?;
    let callable = ip.find_variable_by_id("main$v")?;
    let args = vec![
        new_ref(Variable::from_int(2)),
        new_ref(Variable::from_int(3)),
    ];
    let ret = ip.call_callable(callable, args)?;
    assert_eq!(ret.borrow().int_value()?, 6);
    Ok(())
}

#[test]
fn value_capture_is_a_snapshot() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let base : int = (10);

        let get : f(() -> int) = lambda [base] () -> int { return base; };

        func bump() -> void {
          base = base + 1;
          return;
        }
        "#,
    )?;
    ip.call_function_by_name("main$bump", vec![])?;
    let callable = ip.find_variable_by_id("main$get")?;
    let ret = ip.call_callable(callable, vec![])?;
    // the capture was cloned at lambda construction
    assert_eq!(ret.borrow().int_value()?, 10);
    Ok(())
}

#[test]
fn ref_capture_shares_the_binding() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let counter : int = (0);

        let tick : f(() -> int) = lambda [ref counter] () -> int {
          counter = counter + 1;
          return counter;
        };
        "#,
    )?;
    let callable = ip.find_variable_by_id("main$tick")?;
    let ret = ip.call_callable(callable.clone(), vec![])?;
    assert_eq!(ret.borrow().int_value()?, 1);
    let ret = ip.call_callable(callable, vec![])?;
    assert_eq!(ret.borrow().int_value()?, 2);
    assert_eq!(
        ip.find_variable_by_id("main$counter")?.borrow().int_value()?,
        2
    );
    Ok(())
}

#[test]
fn closure_returned_from_function_keeps_state() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        func make_adder(int step) -> f(() -> int) {
          let acc : int = (0);
          return lambda [ref acc, step] () -> int {
            acc = acc + step;
            return acc;
          };
        }
        "#,
    )?;
    let adder = ip.call_function_by_name(
        "main$make_adder",
        vec![new_ref(Variable::from_int(3))],
    )?;
    let ret = ip.call_callable(adder.clone(), vec![])?;
    assert_eq!(ret.borrow().int_value()?, 3);
    let ret = ip.call_callable(adder, vec![])?;
    assert_eq!(ret.borrow().int_value()?, 6);
    Ok(())
}

#[test]
fn move_capture_consumes_the_source() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let s : string = ("payload");

        let get : f(() -> string) = lambda [move s] () -> string { return s; };
        "#,
    )?;
    let callable = ip.find_variable_by_id("main$get")?;
    let ret = ip.call_callable(callable.clone(), vec![])?;
    assert_eq!(ret.borrow().string_value()?, "payload");
    // calling again still sees the captured value
    let ret = ip.call_callable(callable, vec![])?;
    assert_eq!(ret.borrow().string_value()?, "payload");
    // the source global was moved from
    assert_eq!(
        ip.find_variable_by_id("main$s")?.borrow().string_value()?,
        ""
    );
    Ok(())
}
