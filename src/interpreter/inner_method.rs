//! Fixed method tables of the builtin types.
//!
//! Entries are keyed by `<type-tag><method-name>`, where the tag is `list`
//! for any list type and the textual type name otherwise. Each entry carries
//! a compile-time check mapping argument types to the return type, and a
//! runtime handler mapping (receiver, args) to a value.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::package_unit::PackageUnit;
use crate::types::{is_same_type, Type};

use super::error::{RResult, RuntimeError};
use super::variable::{new_ref, Value, Variable, VarRef};

pub fn is_inner_type(ty: &Type) -> bool {
    ty.is_string() || ty.is_list()
}

fn type_tag(ty: &Type) -> String {
    if ty.is_list() {
        "list".to_string()
    } else {
        ty.type_info()
    }
}

pub type InnerMethodCheck = fn(&Type, &[Type]) -> Result<Type, String>;
pub type InnerMethodHandle = fn(&VarRef, Vec<VarRef>, &PackageUnit) -> RResult<VarRef>;

pub struct InnerTypeMethod {
    checks: HashMap<String, InnerMethodCheck>,
    handles: HashMap<String, InnerMethodHandle>,
}

static INNER_TYPE_METHOD: Lazy<InnerTypeMethod> = Lazy::new(InnerTypeMethod::build);

impl InnerTypeMethod {
    pub fn instance() -> &'static InnerTypeMethod {
        &INNER_TYPE_METHOD
    }

    pub fn type_check(
        &self,
        receiver: &Type,
        method_name: &str,
        args: &[Type],
    ) -> Result<Type, String> {
        let key = format!("{}{}", type_tag(receiver), method_name);
        let check = self
            .checks
            .get(&key)
            .ok_or_else(|| format!("method {method_name} not exist for type {receiver}"))?;
        check(receiver, args)
    }

    pub fn get_handle(&self, receiver: &Type, method_name: &str) -> Option<&InnerMethodHandle> {
        let key = format!("{}{}", type_tag(receiver), method_name);
        self.handles.get(&key)
    }

    fn build() -> InnerTypeMethod {
        let mut checks: HashMap<String, InnerMethodCheck> = HashMap::new();
        let mut handles: HashMap<String, InnerMethodHandle> = HashMap::new();

        // string methods

        checks.insert("stringlen".into(), |_, args| {
            if !args.is_empty() {
                return Err(format!("string.len error, args.len() == {}", args.len()));
            }
            Ok(Type::int())
        });
        handles.insert("stringlen".into(), |obj, _, _| {
            let len = obj.borrow().string_value()?.len();
            Ok(new_ref(Variable::from_int(len as i64)))
        });

        checks.insert("stringat".into(), |_, args| {
            if args.len() != 1 {
                return Err(format!("string.at error, args.len() == {}", args.len()));
            }
            if !args[0].is_int() {
                return Err(format!("string.at error, arg's type == {}", args[0]));
            }
            Ok(Type::byte())
        });
        handles.insert("stringat".into(), |obj, args, _| {
            let value = obj.borrow().string_value()?;
            let index = args[0].borrow().int_value()?;
            if index < 0 || index as usize >= value.len() {
                return Err(RuntimeError::new(format!(
                    "string.at error, index {} out of range : size = {}",
                    index,
                    value.len()
                )));
            }
            Ok(new_ref(Variable::from_byte(value.as_bytes()[index as usize])))
        });

        checks.insert("stringappend".into(), |_, args| {
            if args.len() != 1 {
                return Err(format!("string.append error, args.len() == {}", args.len()));
            }
            if !args[0].is_string() && !args[0].is_byte() {
                return Err(format!("string.append error, arg's type == {}", args[0]));
            }
            Ok(Type::void())
        });
        handles.insert("stringappend".into(), |obj, args, _| {
            // read the argument first, the receiver may be passed to itself
            let suffix = {
                let arg = args[0].borrow();
                match arg.value() {
                    Value::Str(s) => s.clone(),
                    Value::Byte(b) => (*b as char).to_string(),
                    _ => {
                        return Err(RuntimeError::new(
                            "string.append error, arg is not string or byte",
                        ))
                    }
                }
            };
            let mut receiver = obj.borrow_mut();
            let Value::Str(value) = receiver.value_mut() else {
                return Err(RuntimeError::new(
                    "string.append error, receiver is not a string",
                ));
            };
            value.push_str(&suffix);
            Ok(new_ref(Variable::void_value()))
        });

        // list methods

        checks.insert("listsize".into(), |_, args| {
            if !args.is_empty() {
                return Err(format!("list.size error, args.len() == {}", args.len()));
            }
            Ok(Type::int())
        });
        handles.insert("listsize".into(), |obj, _, _| {
            let size = obj.borrow().list_size()?;
            Ok(new_ref(Variable::from_int(size as i64)))
        });

        checks.insert("listat".into(), |receiver, args| {
            if args.len() != 1 {
                return Err(format!("list.at error, args.len() == {}", args.len()));
            }
            if !args[0].is_int() {
                return Err(format!("list.at error, arg's type == {}", args[0]));
            }
            Ok(receiver.element_type().expect("receiver is a list").clone())
        });
        handles.insert("listat".into(), |obj, args, _| {
            let index = args[0].borrow().int_value()?;
            obj.borrow().list_at(index)
        });

        checks.insert("listinsert".into(), |receiver, args| {
            let element = receiver.element_type().expect("receiver is a list");
            if args.len() != 2 {
                return Err(format!("list.insert error, args.len() == {}", args.len()));
            }
            if !args[0].is_int() || !is_same_type(element, &args[1]) {
                return Err(format!(
                    "list.insert error, args type == {} {}",
                    args[0], args[1]
                ));
            }
            Ok(Type::void())
        });
        handles.insert("listinsert".into(), |obj, args, _| {
            let index = args[0].borrow().int_value()?;
            obj.borrow_mut().list_insert(index, args[1].clone())?;
            Ok(new_ref(Variable::void_value()))
        });

        checks.insert("listpush_back".into(), |receiver, args| {
            let element = receiver.element_type().expect("receiver is a list");
            if args.len() != 1 {
                return Err(format!(
                    "list.push_back error, args.len() == {}",
                    args.len()
                ));
            }
            if !is_same_type(element, &args[0]) {
                return Err(format!(
                    "list.push_back error, args type dismatch : {} != {}",
                    element, args[0]
                ));
            }
            Ok(Type::void())
        });
        handles.insert("listpush_back".into(), |obj, args, _| {
            obj.borrow_mut().list_push_back(args[0].clone())?;
            Ok(new_ref(Variable::void_value()))
        });

        checks.insert("listpop_back".into(), |_, args| {
            if !args.is_empty() {
                return Err(format!("list.pop_back error, args.len() == {}", args.len()));
            }
            Ok(Type::void())
        });
        handles.insert("listpop_back".into(), |obj, _, _| {
            obj.borrow_mut().list_pop_back()?;
            Ok(new_ref(Variable::void_value()))
        });

        checks.insert("listresize".into(), |_, args| {
            if args.len() != 1 {
                return Err(format!("list.resize error, args.len() == {}", args.len()));
            }
            if !args[0].is_int() {
                return Err(format!("list.resize error, arg's type == {}", args[0]));
            }
            Ok(Type::void())
        });
        handles.insert("listresize".into(), |obj, args, pu| {
            let new_size = args[0].borrow().int_value()?;
            obj.borrow_mut().list_resize(new_size, pu)?;
            Ok(new_ref(Variable::void_value()))
        });

        checks.insert("listerase".into(), |_, args| {
            if args.len() != 1 {
                return Err(format!("list.erase error, args.len() == {}", args.len()));
            }
            if !args[0].is_int() {
                return Err(format!("list.erase error, arg's type == {}", args[0]));
            }
            Ok(Type::void())
        });
        handles.insert("listerase".into(), |obj, args, _| {
            let index = args[0].borrow().int_value()?;
            obj.borrow_mut().list_erase(index)?;
            Ok(new_ref(Variable::void_value()))
        });

        checks.insert("listclear".into(), |_, args| {
            if !args.is_empty() {
                return Err(format!("list.clear error, args.len() == {}", args.len()));
            }
            Ok(Type::void())
        });
        handles.insert("listclear".into(), |obj, _, _| {
            obj.borrow_mut().list_clear()?;
            Ok(new_ref(Variable::void_value()))
        });

        checks.insert("listempty".into(), |_, args| {
            if !args.is_empty() {
                return Err(format!("list.empty error, args.len() == {}", args.len()));
            }
            Ok(Type::boolean())
        });
        handles.insert("listempty".into(), |obj, _, _| {
            let empty = obj.borrow().list_size()? == 0;
            Ok(new_ref(Variable::from_bool(empty)))
        });

        InnerTypeMethod { checks, handles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_check_entries() {
        let inner = InnerTypeMethod::instance();
        assert_eq!(
            inner.type_check(&Type::string(), "len", &[]).unwrap(),
            Type::int()
        );
        assert_eq!(
            inner
                .type_check(&Type::string(), "at", &[Type::int()])
                .unwrap(),
            Type::byte()
        );
        assert_eq!(
            inner
                .type_check(&Type::string(), "append", &[Type::byte()])
                .unwrap(),
            Type::void()
        );
        let list = Type::list_of(Type::int());
        assert_eq!(inner.type_check(&list, "size", &[]).unwrap(), Type::int());
        assert_eq!(
            inner.type_check(&list, "at", &[Type::int()]).unwrap(),
            Type::int()
        );
        assert_eq!(
            inner
                .type_check(&list, "insert", &[Type::int(), Type::int()])
                .unwrap(),
            Type::void()
        );
        assert_eq!(inner.type_check(&list, "empty", &[]).unwrap(), Type::boolean());
    }

    #[test]
    fn test_type_check_rejections() {
        let inner = InnerTypeMethod::instance();
        assert!(inner.type_check(&Type::string(), "size", &[]).is_err());
        assert!(inner
            .type_check(&Type::list_of(Type::int()), "push_back", &[Type::string()])
            .is_err());
        assert!(inner
            .type_check(&Type::string(), "at", &[Type::string()])
            .is_err());
    }
}
