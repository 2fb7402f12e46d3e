//! Representation of the script language's types.
//!
//! Two types are the same iff their canonical printed forms are the same, so
//! [`Type::type_info`] is the single source of truth for identity.

use std::fmt::Display;

use crate::package_unit::PackageUnit;

pub const BUILTIN_TYPES_WITHOUT_VOID: [&str; 5] = ["string", "int", "double", "byte", "bool"];

#[derive(Debug, Clone, Eq)]
pub enum Type {
    /// A builtin scalar type or a (package qualified) struct name.
    Basic(String),
    Pointer(Box<Type>),
    List(Box<Type>),
    Func { params: Vec<Type>, ret: Box<Type> },
}

impl Type {
    pub fn basic(name: impl Into<String>) -> Self {
        Type::Basic(name.into())
    }

    pub fn void() -> Self {
        Type::Basic("void".to_string())
    }

    pub fn int() -> Self {
        Type::Basic("int".to_string())
    }

    pub fn double() -> Self {
        Type::Basic("double".to_string())
    }

    pub fn byte() -> Self {
        Type::Basic("byte".to_string())
    }

    pub fn boolean() -> Self {
        Type::Basic("bool".to_string())
    }

    pub fn string() -> Self {
        Type::Basic("string".to_string())
    }

    pub fn pointer_to(inner: Type) -> Self {
        Type::Pointer(Box::new(inner))
    }

    pub fn list_of(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn func(params: Vec<Type>, ret: Type) -> Self {
        Type::Func {
            params,
            ret: Box::new(ret),
        }
    }

    /// The canonical textual identity of this type.
    pub fn type_info(&self) -> String {
        match self {
            Type::Basic(name) => name.clone(),
            Type::Pointer(inner) => format!("ptr({})", inner.type_info()),
            Type::List(element) => format!("list({})", element.type_info()),
            Type::Func { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| p.type_info())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("f(({}) -> {})", params, ret.type_info())
            }
        }
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, Type::Basic(_))
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Type::Func { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "void")
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "bool")
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "int")
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "double")
    }

    pub fn is_byte(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "byte")
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "string")
    }

    /// A builtin type is one of the six language scalars (including void).
    pub fn is_builtin(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "void" || BUILTIN_TYPES_WITHOUT_VOID.contains(&name.as_str()))
    }

    /// A struct type is a basic type which is not builtin.
    pub fn is_struct(&self) -> bool {
        self.is_basic() && !self.is_builtin()
    }

    /// The pointed-to type of a pointer type.
    pub fn hold_type(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// The element type of a list type.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::List(element) => Some(element),
            _ => None,
        }
    }

    pub fn param_types(&self) -> Option<&[Type]> {
        match self {
            Type::Func { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn return_type(&self) -> Option<&Type> {
        match self {
            Type::Func { ret, .. } => Some(ret),
            _ => None,
        }
    }

    /// Collect the struct names mentioned anywhere in this type.
    pub fn collect_struct_names(&self, out: &mut Vec<String>) {
        match self {
            Type::Basic(name) => {
                if self.is_struct() {
                    out.push(name.clone());
                }
            }
            Type::Pointer(inner) => inner.collect_struct_names(out),
            Type::List(element) => element.collect_struct_names(out),
            Type::Func { params, ret } => {
                for p in params {
                    p.collect_struct_names(out);
                }
                ret.collect_struct_names(out);
            }
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.type_info() == other.type_info()
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.type_info())
    }
}

pub fn is_same_type(lt: &Type, rt: &Type) -> bool {
    lt.type_info() == rt.type_info()
}

/// The id of a parameter type list, used by synthetic operator names.
pub fn get_type_list_id(types: &[Type]) -> String {
    let mut result = String::new();
    for each in types {
        result += &each.type_info();
        result.push('-');
    }
    result
}

/// Decide whether `target` admits a constructor taking arguments of `args` types.
///
/// The rules, in order: void is never constructible; a single argument of the
/// target type copy-constructs; lists take any number of elements of their
/// element type; structs take exactly their declared fields in order; function
/// types additionally accept a single struct whose type overloads the call
/// operator with a matching signature.
pub fn check_can_construct_by(pu: &PackageUnit, target: &Type, args: &[Type]) -> Result<(), String> {
    if target.is_void() {
        return Err("void type can not be constructed".to_string());
    }
    if args.len() == 1 && is_same_type(target, &args[0]) {
        return Ok(());
    }
    match target {
        Type::List(element) => {
            for (index, each) in args.iter().enumerate() {
                if !is_same_type(element, each) {
                    return Err(format!(
                        "the {}th constructor has type {}, need element type {}",
                        index,
                        each.type_info(),
                        element.type_info()
                    ));
                }
            }
            Ok(())
        }
        Type::Func { params, ret } => {
            if args.len() != 1 {
                return Err(format!(
                    "{} can only be constructed by one argument, got {}",
                    target.type_info(),
                    args.len()
                ));
            }
            if !args[0].is_struct() {
                return Err(format!(
                    "{} can not be constructed by {}",
                    target.type_info(),
                    args[0].type_info()
                ));
            }
            let struct_def = pu
                .find_struct(&args[0].type_info())
                .ok_or_else(|| format!("invalid struct type {}", args[0].type_info()))?;
            let method_name = crate::package_unit::operator_override_name("call", params);
            match struct_def.get_method(&method_name) {
                Some(method) if is_same_type(&method.return_type, ret) => Ok(()),
                _ => Err(format!(
                    "struct {} does not overload the call operator for {}",
                    args[0].type_info(),
                    target.type_info()
                )),
            }
        }
        Type::Basic(name) => {
            if target.is_struct() {
                let struct_def = pu
                    .find_struct(name)
                    .ok_or_else(|| format!("invalid struct type {}", name))?;
                let members = struct_def.data_members();
                if args.len() != members.len() {
                    return Err(format!(
                        "struct {} has {} fields, got {} constructors",
                        name,
                        members.len(),
                        args.len()
                    ));
                }
                for (index, (each, (field_name, field_type))) in
                    args.iter().zip(members.iter()).enumerate()
                {
                    if !is_same_type(each, field_type) {
                        return Err(format!(
                            "the {}th constructor has type {}, field {} needs {}",
                            index,
                            each.type_info(),
                            field_name,
                            field_type.type_info()
                        ));
                    }
                }
                Ok(())
            } else {
                // builtin scalars only admit the copy constructor handled above
                Err(format!(
                    "{} can not be constructed by {} arguments",
                    name,
                    args.len()
                ))
            }
        }
        Type::Pointer(_) => Err(format!(
            "{} can only be copy constructed",
            target.type_info()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_info() {
        assert_eq!(Type::int().type_info(), "int");
        assert_eq!(Type::pointer_to(Type::string()).type_info(), "ptr(string)");
        assert_eq!(Type::list_of(Type::int()).type_info(), "list(int)");
        assert_eq!(
            Type::func(vec![Type::int(), Type::double()], Type::void()).type_info(),
            "f((int, double) -> void)"
        );
        assert_eq!(Type::func(vec![], Type::int()).type_info(), "f(() -> int)");
    }

    #[test]
    fn test_type_equality_is_textual() {
        let a = Type::list_of(Type::basic("main$ms"));
        let b = Type::List(Box::new(Type::Basic("main$ms".to_string())));
        assert_eq!(a, b);
        assert_ne!(a, Type::list_of(Type::int()));
    }

    #[test]
    fn test_type_list_id() {
        let id = get_type_list_id(&[Type::int(), Type::int()]);
        assert_eq!(id, "int-int-");
    }

    #[test]
    fn test_builtin_classification() {
        assert!(Type::void().is_builtin());
        assert!(Type::byte().is_builtin());
        assert!(!Type::basic("main$ms").is_builtin());
        assert!(Type::basic("main$ms").is_struct());
        assert!(!Type::list_of(Type::int()).is_basic());
    }

    #[test]
    fn test_collect_struct_names() {
        let t = Type::func(
            vec![Type::list_of(Type::basic("a$s1"))],
            Type::pointer_to(Type::basic("a$s2")),
        );
        let mut names = vec![];
        t.collect_struct_names(&mut names);
        assert_eq!(names, vec!["a$s1".to_string(), "a$s2".to_string()]);
    }
}
