use std::error::Error;

use test_utils::build_interpreter;

#[test]
fn dealloc_runs_the_destructor_once() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        let destroyed_count : int = (0);

        struct res {
          int id;
        }

        method res {
          func destructor() -> void {
            destroyed_count = destroyed_count + 1;
            return;
          }
        }

        func run() -> int {
          let p : ptr(res) = (alloc res(7));
          let r : res = ref (*p);
          dealloc p;
          return r.id;
        }
        "#,
    )?;
    let ret = ip.call_function_by_name("main$run", vec![])?;
    // the ref binding keeps the object alive past the deallocation
    assert_eq!(ret.borrow().int_value()?, 7);
    assert_eq!(
        ip.find_variable_by_id("main$destroyed_count")?
            .borrow()
            .int_value()?,
        1
    );
    Ok(())
}

#[test]
fn deref_after_dealloc_is_a_runtime_error() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        struct res {
          int id;
        }

        func dangle() -> int {
          let p : ptr(res) = (alloc res(1));
          dealloc p;
          return (*p).id;
        }
        "#,
    )?;
    assert!(ip.call_function_by_name("main$dangle", vec![]).is_err());
    Ok(())
}

#[test]
fn double_dealloc_is_a_runtime_error() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        struct res {
          int id;
        }

        func run() -> void {
          let p : ptr(res) = (alloc res(1));
          dealloc p;
          dealloc p;
          return;
        }
        "#,
    )?;
    assert!(ip.call_function_by_name("main$run", vec![]).is_err());
    Ok(())
}

#[test]
fn dealloc_of_a_plain_binding_is_rejected() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        func run() -> void {
          let x : int = (1);
          let p : ptr(int) = (&x);
          dealloc p;
          return;
        }
        "#,
    )?;
    assert!(ip.call_function_by_name("main$run", vec![]).is_err());
    Ok(())
}

#[test]
fn address_of_roundtrip() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        func roundtrip() -> bool {
          let x : int = (3);
          return (*(&x)) == x;
        }

        func through_binding() -> int {
          let x : int = (3);
          let p : ptr(int) = (&x);
          (*p) = 11;
          return x;
        }
        "#,
    )?;
    assert!(ip
        .call_function_by_name("main$roundtrip", vec![])?
        .borrow()
        .bool_value()?);
    let ret = ip.call_function_by_name("main$through_binding", vec![])?;
    assert_eq!(ret.borrow().int_value()?, 11);
    Ok(())
}

#[test]
fn pointer_to_a_dead_local_is_dangling() -> Result<(), Box<dyn Error>> {
    let mut ip = build_interpreter(
        r#"
        package main;

        func escape() -> ptr(int) {
          let x : int = (3);
          return &x;
        }

        func run() -> int {
          let p : ptr(int) = (call escape:());
          return *p;
        }
        "#,
    )?;
    assert!(ip.call_function_by_name("main$run", vec![]).is_err());
    Ok(())
}
