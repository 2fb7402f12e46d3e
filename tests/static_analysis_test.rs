use test_utils::{build_interpreter, expect_type_check_error};
use wamon::TypeError;

fn is_check_error(error: &TypeError) -> bool {
    matches!(error, TypeError::Check { .. })
}

#[test]
fn undefined_identifier() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> int {
          return b;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn condition_must_be_bool() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> void {
          if (1) {
            return;
          }
          return;
        }
        "#,
    );
    assert!(is_check_error(&error));

    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> void {
          while ("x") {
            return;
          }
          return;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn duplicate_parameter_names() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f(int a, int a) -> int {
          return a;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn duplicate_definition_in_one_scope() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> void {
          let a : int = (0);
          let a : int = (1);
          return;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn shadowing_in_nested_scope_is_fine() {
    build_interpreter(
        r#"
        package main;
        func f() -> int {
          let a : int = (0);
          {
            let a : int = (1);
            a = 2;
          }
          return a;
        }
        "#,
    )
    .unwrap();
}

#[test]
fn cyclic_struct_dependency() {
    let error = expect_type_check_error(
        r#"
        package main;
        struct a {
          b other;
        }
        struct b {
          a other;
        }
        "#,
    );
    assert!(is_check_error(&error));

    // a pointer field still forms a dependency edge
    let error = expect_type_check_error(
        r#"
        package main;
        struct node {
          ptr(node) next;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn deterministic_return_required() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f(bool c) -> int {
          if (c) {
            return 1;
          }
        }
        "#,
    );
    assert!(matches!(error, TypeError::DeterministicReturn { .. }));
}

#[test]
fn deterministic_return_through_if_else() {
    build_interpreter(
        r#"
        package main;
        func f(bool c) -> int {
          if (c) {
            return 1;
          } else {
            return 2;
          }
        }
        "#,
    )
    .unwrap();
}

#[test]
fn break_outside_loop() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> void {
          break;
          return;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn continue_through_nested_block_is_fine() {
    build_interpreter(
        r#"
        package main;
        func f(int n) -> int {
          let i : int = (0);
          while (i < n) {
            i = i + 1;
            if (i == 2) {
              continue;
            }
          }
          return i;
        }
        "#,
    )
    .unwrap();
}

#[test]
fn assignment_between_different_types() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> void {
          let a : int = (0);
          a = "x";
          return;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn forward_global_reference_rejected() {
    let error = expect_type_check_error(
        r#"
        package main;
        let a : int = (b);
        let b : int = (1);
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn void_is_only_a_return_type() {
    let error = expect_type_check_error(
        r#"
        package main;
        let a : void = (0);
        "#,
    );
    assert!(is_check_error(&error));

    let error = expect_type_check_error(
        r#"
        package main;
        func f(void v) -> void {
          return;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn return_type_mismatch() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> int {
          return "x";
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn construct_with_wrong_arity_or_type() {
    let error = expect_type_check_error(
        r#"
        package main;
        struct point {
          int x;
          int y;
        }
        let p : point = (1);
        "#,
    );
    assert!(is_check_error(&error));

    let error = expect_type_check_error(
        r#"
        package main;
        let l : list(int) = (1, "x");
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn self_outside_method() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> int {
          return self;
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn trait_cast_missing_member() {
    let error = expect_type_check_error(
        r#"
        package main;

        struct trait named {
          string name;
        }

        method named {
          func GetName() -> string;
        }

        struct ms {
          string name;
        }

        let v : named = new ms("x") as named;
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn destructor_signature_enforced() {
    let error = expect_type_check_error(
        r#"
        package main;
        struct s {
          int a;
        }
        method s {
          func destructor(int x) -> void {
            return;
          }
        }
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn capture_of_function_rejected() {
    let error = expect_type_check_error(
        r#"
        package main;
        func g() -> int {
          return 1;
        }
        let v : f(() -> int) = lambda [g] () -> int { return 1; };
        "#,
    );
    assert!(is_check_error(&error));
}

#[test]
fn inner_method_argument_types() {
    let error = expect_type_check_error(
        r#"
        package main;
        func f() -> void {
          let l : list(int) = ();
          call l:push_back("x");
          return;
        }
        "#,
    );
    assert!(is_check_error(&error));
}
