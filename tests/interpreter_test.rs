use std::error::Error;

use test_utils::build_interpreter;
use wamon::{new_ref, Variable};

#[test]
fn call_function() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let a : int = (2);
        let b : string = ("nanpang");

        func my_func() -> int {
          return a + 2;
        }
        "#,
    )?;
    let v = ip.call_function_by_name("main$my_func", vec![])?;
    assert_eq!(v.borrow().type_info(), "int");
    assert_eq!(v.borrow().int_value()?, 4);
    Ok(())
}

#[test]
fn global_variables() -> Result<(), Box<dyn Error>> {
    let ip = build_interpreter(
        r#"
        package main;

        struct my_struct_name {
          int a;
          double b;
          string c;
        }

        let mydata : my_struct_name = (2, 3.5, "hello");
        let myptr : ptr(my_struct_name) = (&mydata);
        let mylist : list(int) = (2, 3, 4);
        "#,
    )?;

    let v = ip.find_variable_by_id("main$mydata")?;
    assert_eq!(v.borrow().type_info(), "main$my_struct_name");
    assert_eq!(
        v.borrow().get_data_member("a")?.borrow().int_value()?,
        2
    );

    let p = ip.find_variable_by_id("main$myptr")?;
    assert_eq!(p.borrow().type_info(), "ptr(main$my_struct_name)");
    assert!(std::rc::Rc::ptr_eq(&p.borrow().deref()?, &v));

    let l = ip.find_variable_by_id("main$mylist")?;
    assert_eq!(l.borrow().type_info(), "list(int)");
    assert_eq!(l.borrow().list_size()?, 3);
    assert_eq!(l.borrow().list_at(0)?.borrow().int_value()?, 2);
    Ok(())
}

#[test]
fn call_method() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        struct my_struct_name {
          int a;
          double b;
          string c;
        }

        method my_struct_name {
          func get_age() -> int {
            return self.a;
          }
        }

        let ms : my_struct_name = (25, 2.1, "bob");
        "#,
    )?;
    let obj = ip.find_variable_by_id("main$ms")?;
    let ret = ip.call_method_by_name(obj, "get_age", vec![])?;
    assert_eq!(ret.borrow().type_info(), "int");
    assert_eq!(ret.borrow().int_value()?, 25);
    Ok(())
}

#[test]
fn call_with_embedder_arguments() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        func stradd(string a, string b) -> string {
          return a + b;
        }
        "#,
    )?;
    let args = vec![
        new_ref(Variable::from_string("hello ")),
        new_ref(Variable::from_string("world")),
    ];
    let ret = ip.call_function_by_name("main$stradd", args)?;
    assert_eq!(ret.borrow().string_value()?, "hello world");
    Ok(())
}

#[test]
fn assignment_updates_global() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let a : int = (0);

        func set_and_inc() -> int {
          a = 4;
          a = a + 1;
          return a;
        }
        "#,
    )?;
    let ret = ip.call_function_by_name("main$set_and_inc", vec![])?;
    assert_eq!(ret.borrow().int_value()?, 5);
    assert_eq!(
        ip.find_variable_by_id("main$a")?.borrow().int_value()?,
        5
    );
    Ok(())
}

#[test]
fn loops_with_break_and_continue() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        func sum_even_until(int limit) -> int {
          let sum : int = (0);
          let i : int = (0);
          for (i = 0; i < 100; i = i + 1) {
            if (i == limit) {
              break;
            }
            if (i / 2 * 2 == i) {
              continue;
            }
            sum = sum + i;
          }
          return sum;
        }

        func count_down(int from) -> int {
          let steps : int = (0);
          while (from > 0) {
            from = from - 1;
            steps = steps + 1;
          }
          return steps;
        }
        "#,
    )?;
    // odd numbers below 10 sum to 25
    let args = vec![new_ref(Variable::from_int(10))];
    let ret = ip.call_function_by_name("main$sum_even_until", args)?;
    assert_eq!(ret.borrow().int_value()?, 25);

    let args = vec![new_ref(Variable::from_int(7))];
    let ret = ip.call_function_by_name("main$count_down", args)?;
    assert_eq!(ret.borrow().int_value()?, 7);
    Ok(())
}

#[test]
fn structural_compare() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        struct point {
          int x;
          int y;
        }

        func eq_lists() -> bool {
          let a : list(int) = (1, 2);
          let b : list(int) = (1, 2);
          return a == b;
        }

        func eq_points() -> bool {
          let a : point = (1, 2);
          let b : point = (1, 2);
          return a == b;
        }

        func ne_points() -> bool {
          let a : point = (1, 2);
          let b : point = (1, 3);
          return a == b;
        }
        "#,
    )?;
    assert!(ip.call_function_by_name("main$eq_lists", vec![])?.borrow().bool_value()?);
    assert!(ip.call_function_by_name("main$eq_points", vec![])?.borrow().bool_value()?);
    assert!(!ip.call_function_by_name("main$ne_points", vec![])?.borrow().bool_value()?);
    Ok(())
}

#[test]
fn method_wins_over_free_function() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        struct s {
          int a;
        }

        method s {
          func get() -> int {
            return 1;
          }
        }

        func get(s obj) -> int {
          return 2;
        }

        func run() -> int {
          let obj : s = (5);
          return call get:(obj);
        }
        "#,
    )?;
    let ret = ip.call_function_by_name("main$run", vec![])?;
    assert_eq!(ret.borrow().int_value()?, 1);
    Ok(())
}

#[test]
fn ref_parameter_shares_the_caller_binding() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let data : list(int) = (1, 2);

        func grow(list(int) ref l) -> void {
          call l:push_back(3);
          return;
        }

        func copy_grow(list(int) l) -> void {
          call l:push_back(3);
          return;
        }

        func run() -> int {
          call grow:(data);
          call copy_grow:(data);
          return call data:size();
        }
        "#,
    )?;
    let ret = ip.call_function_by_name("main$run", vec![])?;
    // the ref call mutated the global, the by-value call mutated a clone
    assert_eq!(ret.borrow().int_value()?, 3);
    Ok(())
}

#[test]
fn void_function_may_fall_off_the_end() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let hits : int = (0);

        func bump() -> void {
          hits = hits + 1;
        }
        "#,
    )?;
    ip.call_function_by_name("main$bump", vec![])?;
    ip.call_function_by_name("main$bump", vec![])?;
    assert_eq!(ip.find_variable_by_id("main$hits")?.borrow().int_value()?, 2);
    Ok(())
}

#[test]
fn logical_operators_evaluate_both_operands() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let calls : int = (0);

        func observed(bool v) -> bool {
          calls = calls + 1;
          return v;
        }

        func run() -> bool {
          return call observed:(false) && call observed:(true);
        }
        "#,
    )?;
    let ret = ip.call_function_by_name("main$run", vec![])?;
    assert!(!ret.borrow().bool_value()?);
    // no short circuit: both sides were evaluated
    assert_eq!(
        ip.find_variable_by_id("main$calls")?.borrow().int_value()?,
        2
    );
    Ok(())
}
