use std::error::Error;

use test_utils::build_interpreter;
use wamon::{new_ref, Variable};

#[test]
fn user_defined_binary_overload() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        struct vec2 {
          int x;
          int y;
        }

        operator + (vec2 a, vec2 b) -> vec2 {
          return new vec2(a.x + b.x, a.y + b.y);
        }

        func add() -> vec2 {
          let a : vec2 = (1, 2);
          let b : vec2 = (3, 4);
          return a + b;
        }
        "#,
    )?;
    let v = ip.call_function_by_name("main$add", vec![])?;
    assert_eq!(v.borrow().get_data_member("x")?.borrow().int_value()?, 4);
    assert_eq!(v.borrow().get_data_member("y")?.borrow().int_value()?, 6);
    Ok(())
}

#[test]
fn builtin_handler_wins_over_overload_lookup() -> Result<(), Box<dyn Error>> {
    // int + int has a builtin handler, so dispatch never reaches a user
    // overload table for it
    let mut ip = build_interpreter(
        r#"
        package main;
        func add(int a, int b) -> int {
          return a + b;
        }
        "#,
    )?;
    let args = vec![
        new_ref(Variable::from_int(20)),
        new_ref(Variable::from_int(22)),
    ];
    let v = ip.call_function_by_name("main$add", args)?;
    assert_eq!(v.borrow().int_value()?, 42);
    Ok(())
}

#[test]
fn relational_operators() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;
        func check() -> bool {
          let a : int = (3);
          let b : int = (5);
          return (a < b) && (b >= 5) && (a <= 3) && (b > a);
        }
        "#,
    )?;
    let v = ip.call_function_by_name("main$check", vec![])?;
    assert!(v.borrow().bool_value()?);
    Ok(())
}

#[test]
fn call_operator_overload_bound_by_move() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        struct m_struct {
          int a;
        }

        method m_struct {
          operator () (int b) -> int {
            return self.a + b;
          }
        }

        let ms : m_struct = (2);
        let v : f((int) -> int) = move ms;
        "#,
    )?;
    let callable = ip.find_variable_by_id("main$v")?;
    let ret = ip.call_callable(callable, vec![new_ref(Variable::from_int(10))])?;
    assert_eq!(ret.borrow().int_value()?, 12);
    Ok(())
}

#[test]
fn callable_from_named_function() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        func double_it(int a) -> int {
          return a * 2;
        }

        let v : f((int) -> int) = (double_it);

        func apply_twice(f((int) -> int) g, int x) -> int {
          return call g:(call g:(x));
        }

        func run() -> int {
          return call apply_twice:(v, 5);
        }
        "#,
    )?;
    let ret = ip.call_function_by_name("main$run", vec![])?;
    assert_eq!(ret.borrow().int_value()?, 20);

    let callable = ip.find_variable_by_id("main$v")?;
    let ret = ip.call_callable(callable, vec![new_ref(Variable::from_int(21))])?;
    assert_eq!(ret.borrow().int_value()?, 42);
    Ok(())
}

#[test]
fn overload_is_reached_only_on_builtin_miss() -> Result<(), Box<dyn Error>> {
    // - on strings has no builtin handler, so dispatch falls back to the
    // user overload with the matching synthetic name
    let mut ip = build_interpreter(
        r#"
        package main;

        operator - (string a, string b) -> int {
          return call a:len() - call b:len();
        }

        func diff() -> int {
          let a : string = ("hello");
          let b : string = ("hi");
          return a - b;
        }
        "#,
    )?;
    let ret = ip.call_function_by_name("main$diff", vec![])?;
    assert_eq!(ret.borrow().int_value()?, 3);
    Ok(())
}
