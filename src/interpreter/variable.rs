//! The runtime variable model.
//!
//! Every variable carries its type, a value category and an optional name.
//! Variables are shared through `Rc<RefCell<_>>`; pointers hold a `Weak` back
//! reference and therefore never extend a referent's lifetime. Cloning an
//! rvalue steals its payload, leaving the source consumed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::json;

use crate::package_unit::PackageUnit;
use crate::types::{is_same_type, Type};

use super::error::{RResult, RuntimeError};

pub type VarRef = Rc<RefCell<Variable>>;

pub fn new_ref(variable: Variable) -> VarRef {
    Rc::new(RefCell::new(variable))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    LValue,
    RValue,
}

#[derive(Debug)]
pub struct StructValue {
    pub members: Vec<(String, VarRef)>,
    /// Only set on values of trait type; every operation delegates to it.
    pub trait_proxy: Option<VarRef>,
}

/// A callable: a named function has neither receiver nor captures, a lambda
/// carries captures, a struct overloading `()` is carried as the receiver.
#[derive(Debug)]
pub struct FunctionValue {
    pub func_name: String,
    pub obj: Option<VarRef>,
    pub captures: Vec<VarRef>,
}

#[derive(Debug)]
pub enum Value {
    Void,
    Int(i64),
    Double(f64),
    Bool(bool),
    Byte(u8),
    Str(String),
    Pointer(Weak<RefCell<Variable>>),
    List(Vec<VarRef>),
    Struct(StructValue),
    Function(FunctionValue),
}

impl Value {
    /// The payload a consumed variable is left with after a move.
    fn hollow(&self) -> Value {
        match self {
            Value::Void => Value::Void,
            Value::Int(_) => Value::Int(0),
            Value::Double(_) => Value::Double(0.0),
            Value::Bool(_) => Value::Bool(true),
            Value::Byte(_) => Value::Byte(0),
            Value::Str(_) => Value::Str(String::new()),
            Value::Pointer(_) => Value::Pointer(Weak::new()),
            Value::List(_) => Value::List(vec![]),
            Value::Struct(_) => Value::Struct(StructValue {
                members: vec![],
                trait_proxy: None,
            }),
            Value::Function(_) => Value::Function(FunctionValue {
                func_name: String::new(),
                obj: None,
                captures: vec![],
            }),
        }
    }
}

#[derive(Debug)]
pub struct Variable {
    ty: Type,
    name: String,
    vc: ValueCategory,
    value: Value,
}

/// Create a default constructed variable of the given type. `bool` defaults
/// to `true`, numbers to zero, strings and lists to empty, pointers dangling;
/// struct fields are default constructed recursively in declaration order.
pub fn variable_factory(
    ty: &Type,
    vc: ValueCategory,
    name: &str,
    pu: &PackageUnit,
) -> RResult<Variable> {
    let value = default_value(ty, vc, pu)?;
    Ok(Variable {
        ty: ty.clone(),
        name: name.to_string(),
        vc,
        value,
    })
}

fn default_value(ty: &Type, vc: ValueCategory, pu: &PackageUnit) -> RResult<Value> {
    match ty {
        Type::Basic(name) => match name.as_str() {
            "void" => Ok(Value::Void),
            "int" => Ok(Value::Int(0)),
            "double" => Ok(Value::Double(0.0)),
            "bool" => Ok(Value::Bool(true)),
            "byte" => Ok(Value::Byte(0)),
            "string" => Ok(Value::Str(String::new())),
            _ => {
                let struct_def = pu.find_struct(name).ok_or_else(|| {
                    RuntimeError::new(format!("variable factory error, invalid type {name}"))
                })?;
                let mut members = vec![];
                for (field, field_type) in struct_def.data_members() {
                    let member = variable_factory(field_type, vc, field, pu)?;
                    members.push((field.clone(), new_ref(member)));
                }
                Ok(Value::Struct(StructValue {
                    members,
                    trait_proxy: None,
                }))
            }
        },
        Type::Pointer(_) => Ok(Value::Pointer(Weak::new())),
        Type::List(_) => Ok(Value::List(vec![])),
        Type::Func { .. } => Ok(Value::Function(FunctionValue {
            func_name: String::new(),
            obj: None,
            captures: vec![],
        })),
    }
}

impl Variable {
    fn anonymous(ty: Type, value: Value) -> Variable {
        Variable {
            ty,
            name: String::new(),
            vc: ValueCategory::RValue,
            value,
        }
    }

    pub fn void_value() -> Variable {
        Variable::anonymous(Type::void(), Value::Void)
    }

    pub fn from_int(v: i64) -> Variable {
        Variable::anonymous(Type::int(), Value::Int(v))
    }

    pub fn from_double(v: f64) -> Variable {
        Variable::anonymous(Type::double(), Value::Double(v))
    }

    pub fn from_bool(v: bool) -> Variable {
        Variable::anonymous(Type::boolean(), Value::Bool(v))
    }

    pub fn from_byte(v: u8) -> Variable {
        Variable::anonymous(Type::byte(), Value::Byte(v))
    }

    pub fn from_string(v: impl Into<String>) -> Variable {
        Variable::anonymous(Type::string(), Value::Str(v.into()))
    }

    /// A callable value.
    pub fn function(
        ty: Type,
        func_name: String,
        obj: Option<VarRef>,
        captures: Vec<VarRef>,
    ) -> Variable {
        Variable::anonymous(
            ty,
            Value::Function(FunctionValue {
                func_name,
                obj,
                captures,
            }),
        )
    }

    /// A value of trait type delegating to a concrete struct value.
    pub fn trait_object(ty: Type, proxy: VarRef) -> Variable {
        Variable::anonymous(
            ty,
            Value::Struct(StructValue {
                members: vec![],
                trait_proxy: Some(proxy),
            }),
        )
    }

    /// An rvalue pointer holding a weak reference to `target`.
    pub fn pointer_rvalue(target: &VarRef) -> Variable {
        let ty = Type::pointer_to(target.borrow().ty().clone());
        Variable::anonymous(ty, Value::Pointer(Rc::downgrade(target)))
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn type_info(&self) -> String {
        self.ty.type_info()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn value_category(&self) -> ValueCategory {
        self.vc
    }

    pub fn is_rvalue(&self) -> bool {
        self.vc == ValueCategory::RValue
    }

    /// Category changes propagate to every transitively owned sub-value.
    pub fn change_category(&mut self, vc: ValueCategory) {
        self.vc = vc;
        match &mut self.value {
            Value::List(elements) => {
                for each in elements {
                    each.borrow_mut().change_category(vc);
                }
            }
            Value::Struct(sv) => {
                for (_, member) in &mut sv.members {
                    member.borrow_mut().change_category(vc);
                }
                if let Some(proxy) = &sv.trait_proxy {
                    proxy.borrow_mut().change_category(vc);
                }
            }
            Value::Function(fv) => {
                if let Some(obj) = &fv.obj {
                    obj.borrow_mut().change_category(vc);
                }
                for each in &fv.captures {
                    each.borrow_mut().change_category(vc);
                }
            }
            _ => {}
        }
    }

    // scalar accessors

    pub fn int_value(&self) -> RResult<i64> {
        match &self.value {
            Value::Int(v) => Ok(*v),
            _ => Err(self.access_error("int")),
        }
    }

    pub fn double_value(&self) -> RResult<f64> {
        match &self.value {
            Value::Double(v) => Ok(*v),
            _ => Err(self.access_error("double")),
        }
    }

    pub fn bool_value(&self) -> RResult<bool> {
        match &self.value {
            Value::Bool(v) => Ok(*v),
            _ => Err(self.access_error("bool")),
        }
    }

    pub fn byte_value(&self) -> RResult<u8> {
        match &self.value {
            Value::Byte(v) => Ok(*v),
            _ => Err(self.access_error("byte")),
        }
    }

    pub fn string_value(&self) -> RResult<String> {
        match &self.value {
            Value::Str(v) => Ok(v.clone()),
            _ => Err(self.access_error("string")),
        }
    }

    fn access_error(&self, expected: &str) -> RuntimeError {
        RuntimeError::new(format!(
            "access {} value on variable of type {}",
            expected,
            self.type_info()
        ))
    }

    // pointers

    pub fn deref(&self) -> RResult<VarRef> {
        match &self.value {
            Value::Pointer(weak) => weak.upgrade().ok_or_else(|| {
                RuntimeError::new("dereference error, the object has been destroyed")
            }),
            _ => Err(self.access_error("pointer")),
        }
    }

    pub fn set_hold_variable(&mut self, target: &VarRef) -> RResult<()> {
        match &mut self.value {
            Value::Pointer(weak) => {
                *weak = Rc::downgrade(target);
                Ok(())
            }
            _ => Err(self.access_error("pointer")),
        }
    }

    // struct members

    pub fn get_data_member(&self, member_name: &str) -> RResult<VarRef> {
        match &self.value {
            Value::Struct(sv) => {
                if let Some(proxy) = &sv.trait_proxy {
                    return proxy.borrow().get_data_member(member_name);
                }
                sv.members
                    .iter()
                    .find(|(n, _)| n == member_name)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        RuntimeError::new(format!(
                            "get data member error, {} not exist in {}",
                            member_name,
                            self.type_info()
                        ))
                    })
            }
            _ => Err(self.access_error("struct")),
        }
    }

    pub fn trait_proxy(&self) -> Option<VarRef> {
        match &self.value {
            Value::Struct(sv) => sv.trait_proxy.clone(),
            _ => None,
        }
    }

    // lists

    fn list_elements(&self) -> RResult<&Vec<VarRef>> {
        match &self.value {
            Value::List(elements) => Ok(elements),
            _ => Err(self.access_error("list")),
        }
    }

    fn list_elements_mut(&mut self) -> RResult<&mut Vec<VarRef>> {
        let message = format!(
            "access list value on variable of type {}",
            self.ty.type_info()
        );
        match &mut self.value {
            Value::List(elements) => Ok(elements),
            _ => Err(RuntimeError::new(message)),
        }
    }

    pub fn list_size(&self) -> RResult<usize> {
        Ok(self.list_elements()?.len())
    }

    pub fn list_at(&self, index: i64) -> RResult<VarRef> {
        let elements = self.list_elements()?;
        if index < 0 || index as usize >= elements.len() {
            return Err(RuntimeError::new(format!(
                "list.at error, index {} out of range, size = {}",
                index,
                elements.len()
            )));
        }
        Ok(elements[index as usize].clone())
    }

    pub fn list_push_back(&mut self, element: VarRef) -> RResult<()> {
        let vc = self.vc;
        let mut transferred = element.borrow_mut().clone_value();
        transferred.change_category(vc);
        self.list_elements_mut()?.push(new_ref(transferred));
        Ok(())
    }

    pub fn list_pop_back(&mut self) -> RResult<()> {
        let elements = self.list_elements_mut()?;
        if elements.is_empty() {
            return Err(RuntimeError::new("list.pop_back error, empty list"));
        }
        elements.pop();
        Ok(())
    }

    pub fn list_insert(&mut self, index: i64, element: VarRef) -> RResult<()> {
        let vc = self.vc;
        let size = self.list_size()?;
        if index < 0 || index as usize > size {
            return Err(RuntimeError::new(format!(
                "list.insert error, index = {index}, size = {size}"
            )));
        }
        let mut transferred = element.borrow_mut().clone_value();
        transferred.change_category(vc);
        self.list_elements_mut()?
            .insert(index as usize, new_ref(transferred));
        Ok(())
    }

    pub fn list_erase(&mut self, index: i64) -> RResult<()> {
        let size = self.list_size()?;
        if index < 0 || index as usize >= size {
            return Err(RuntimeError::new(format!(
                "list.erase error, index = {index}, size = {size}"
            )));
        }
        self.list_elements_mut()?.remove(index as usize);
        Ok(())
    }

    pub fn list_resize(&mut self, new_size: i64, pu: &PackageUnit) -> RResult<()> {
        if new_size < 0 {
            return Err(RuntimeError::new(format!(
                "list.resize error, invalid size {new_size}"
            )));
        }
        let element_type = match self.ty.element_type() {
            Some(element) => element.clone(),
            None => return Err(self.access_error("list")),
        };
        let vc = self.vc;
        let new_size = new_size as usize;
        let elements = self.list_elements_mut()?;
        if new_size <= elements.len() {
            elements.truncate(new_size);
            return Ok(());
        }
        let grow = new_size - elements.len();
        for _ in 0..grow {
            let element = variable_factory(&element_type, vc, "", pu)?;
            self.list_elements_mut()?.push(new_ref(element));
        }
        Ok(())
    }

    pub fn list_clear(&mut self) -> RResult<()> {
        self.list_elements_mut()?.clear();
        Ok(())
    }

    // construction, clone, assign, compare

    /// Construct this variable's payload from an ordered argument list.
    /// A single argument of the same type copy constructs (stealing the
    /// payload when the argument is an rvalue); otherwise lists take their
    /// elements, structs their fields in declaration order, and function
    /// values a struct overloading the call operator.
    pub fn construct_by_fields(&mut self, fields: &[VarRef], pu: &PackageUnit) -> RResult<()> {
        if fields.len() == 1 && fields[0].borrow().type_info() == self.type_info() {
            let transferred = fields[0].borrow_mut().clone_value();
            self.value = transferred.value;
            self.change_category(self.vc);
            return Ok(());
        }
        match self.ty.clone() {
            Type::Basic(name) => {
                if !self.ty.is_struct() {
                    return Err(RuntimeError::new(format!(
                        "{} can not be constructed by {} fields",
                        name,
                        fields.len()
                    )));
                }
                let struct_def = pu.find_struct(&name).ok_or_else(|| {
                    RuntimeError::new(format!("construct error, invalid type {name}"))
                })?;
                let members_def = struct_def.data_members();
                if fields.len() != members_def.len() {
                    return Err(RuntimeError::new(format!(
                        "construct error, {} has {} fields, got {}",
                        name,
                        members_def.len(),
                        fields.len()
                    )));
                }
                let mut members = vec![];
                for (field, (member_name, member_type)) in fields.iter().zip(members_def.iter()) {
                    if field.borrow().type_info() != member_type.type_info() {
                        return Err(RuntimeError::new(format!(
                            "construct error, field {} type dismatch : {} != {}",
                            member_name,
                            field.borrow().type_info(),
                            member_type.type_info()
                        )));
                    }
                    let mut transferred = field.borrow_mut().clone_value();
                    transferred.set_name(member_name.clone());
                    transferred.change_category(self.vc);
                    members.push((member_name.clone(), new_ref(transferred)));
                }
                self.value = Value::Struct(StructValue {
                    members,
                    trait_proxy: None,
                });
                Ok(())
            }
            Type::List(element_type) => {
                let mut elements = vec![];
                for each in fields {
                    if each.borrow().type_info() != element_type.type_info() {
                        return Err(RuntimeError::new(format!(
                            "construct error, element type dismatch : {} != {}",
                            each.borrow().type_info(),
                            element_type.type_info()
                        )));
                    }
                    let mut transferred = each.borrow_mut().clone_value();
                    transferred.change_category(self.vc);
                    elements.push(new_ref(transferred));
                }
                self.value = Value::List(elements);
                Ok(())
            }
            Type::Func { .. } => {
                if fields.len() != 1 {
                    return Err(RuntimeError::new(format!(
                        "construct error, {} needs one field, got {}",
                        self.type_info(),
                        fields.len()
                    )));
                }
                if !fields[0].borrow().ty().is_struct() {
                    return Err(RuntimeError::new(format!(
                        "construct error, {} can not be constructed by {}",
                        self.type_info(),
                        fields[0].borrow().type_info()
                    )));
                }
                let mut transferred = fields[0].borrow_mut().clone_value();
                transferred.change_category(self.vc);
                self.value = Value::Function(FunctionValue {
                    func_name: String::new(),
                    obj: Some(new_ref(transferred)),
                    captures: vec![],
                });
                Ok(())
            }
            _ => Err(RuntimeError::new(format!(
                "construct error, {} can only be copy constructed",
                self.type_info()
            ))),
        }
    }

    /// Clone yields an anonymous rvalue with the same type. Cloning an
    /// rvalue steals the payload and leaves the source consumed.
    pub fn clone_value(&mut self) -> Variable {
        if self.is_rvalue() {
            let hollow = self.value.hollow();
            let value = std::mem::replace(&mut self.value, hollow);
            return Variable::anonymous(self.ty.clone(), value);
        }
        let value = match &self.value {
            Value::Void => Value::Void,
            Value::Int(v) => Value::Int(*v),
            Value::Double(v) => Value::Double(*v),
            Value::Bool(v) => Value::Bool(*v),
            Value::Byte(v) => Value::Byte(*v),
            Value::Str(v) => Value::Str(v.clone()),
            Value::Pointer(weak) => Value::Pointer(weak.clone()),
            Value::List(elements) => Value::List(
                elements
                    .iter()
                    .map(|e| new_ref(e.borrow_mut().clone_value()))
                    .collect(),
            ),
            Value::Struct(sv) => Value::Struct(StructValue {
                members: sv
                    .members
                    .iter()
                    .map(|(n, v)| (n.clone(), new_ref(v.borrow_mut().clone_value())))
                    .collect(),
                trait_proxy: sv
                    .trait_proxy
                    .as_ref()
                    .map(|p| new_ref(p.borrow_mut().clone_value())),
            }),
            Value::Function(fv) => Value::Function(FunctionValue {
                func_name: fv.func_name.clone(),
                obj: fv.obj.as_ref().map(|o| new_ref(o.borrow_mut().clone_value())),
                captures: fv
                    .captures
                    .iter()
                    .map(|c| new_ref(c.borrow_mut().clone_value()))
                    .collect(),
            }),
        };
        Variable::anonymous(self.ty.clone(), value)
    }

    /// Assignment transfers the payload only; the target keeps its name and
    /// value category. Both sides must have the same type.
    pub fn assign(&mut self, other: &VarRef) -> RResult<()> {
        self.check_type_match(&other.borrow())?;
        let transferred = other.borrow_mut().clone_value();
        self.value = transferred.value;
        self.change_category(self.vc);
        Ok(())
    }

    /// Compare is defined only between values of the same type. Pointer
    /// equality is identity of the referent; two dangling pointers compare
    /// equal. Trait values compare through their proxies, plain callables by
    /// mangled name.
    pub fn compare(&self, other: &VarRef) -> RResult<bool> {
        let other = other.borrow();
        self.check_type_match(&other)?;
        match (&self.value, &other.value) {
            (Value::Void, Value::Void) => Ok(true),
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Double(a), Value::Double(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Byte(a), Value::Byte(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Pointer(a), Value::Pointer(b)) => match (a.upgrade(), b.upgrade()) {
                (Some(a), Some(b)) => Ok(Rc::ptr_eq(&a, &b)),
                (None, None) => Ok(true),
                _ => Ok(false),
            },
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.borrow().compare(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Struct(a), Value::Struct(b)) => match (&a.trait_proxy, &b.trait_proxy) {
                (Some(pa), Some(pb)) => pa.borrow().compare(pb),
                (None, None) => {
                    if a.members.len() != b.members.len() {
                        return Ok(false);
                    }
                    for ((_, x), (_, y)) in a.members.iter().zip(b.members.iter()) {
                        if !x.borrow().compare(y)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                _ => Ok(false),
            },
            (Value::Function(a), Value::Function(b)) => match (&a.obj, &b.obj) {
                (Some(oa), Some(ob)) => oa.borrow().compare(ob),
                (None, None) => Ok(a.func_name == b.func_name),
                _ => Ok(false),
            },
            _ => Err(RuntimeError::new(format!(
                "compare error, payload kind dismatch on type {}",
                self.type_info()
            ))),
        }
    }

    fn check_type_match(&self, other: &Variable) -> RResult<()> {
        if is_same_type(&self.ty, other.ty()) {
            return Ok(());
        }
        Err(RuntimeError::new(format!(
            "type dismatch : {} != {}",
            self.type_info(),
            other.type_info()
        )))
    }

    /// Structured rendering of the value, used by the CLI and the tests.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.value {
            Value::Void => serde_json::Value::Null,
            Value::Int(v) => json!(v),
            Value::Double(v) => json!(v),
            Value::Bool(v) => json!(v),
            Value::Byte(v) => json!(v),
            Value::Str(v) => json!(v),
            Value::Pointer(weak) => match weak.upgrade() {
                Some(target) => json!({ "ptr": target.borrow().to_json() }),
                None => json!("nullptr"),
            },
            Value::List(elements) => serde_json::Value::Array(
                elements.iter().map(|e| e.borrow().to_json()).collect(),
            ),
            Value::Struct(sv) => {
                if let Some(proxy) = &sv.trait_proxy {
                    return proxy.borrow().to_json();
                }
                let mut object = serde_json::Map::new();
                for (name, member) in &sv.members {
                    object.insert(name.clone(), member.borrow().to_json());
                }
                serde_json::Value::Object(object)
            }
            Value::Function(fv) => {
                if fv.obj.is_some() {
                    json!(format!("func {} callable", self.type_info()))
                } else {
                    json!(format!("func {} {}", self.type_info(), fv.func_name))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_unit::StructDef;

    fn test_pu() -> PackageUnit {
        let mut pu = PackageUnit::new();
        pu.set_name("main");
        let mut def = StructDef::new("main$ms", false);
        def.add_data_member("a", Type::int()).unwrap();
        def.add_data_member("b", Type::string()).unwrap();
        pu.add_struct_def(def).unwrap();
        pu
    }

    #[test]
    fn test_factory_defaults() {
        let pu = test_pu();
        let v = variable_factory(&Type::boolean(), ValueCategory::LValue, "b", &pu).unwrap();
        assert_eq!(v.bool_value().unwrap(), true);
        let v = variable_factory(&Type::int(), ValueCategory::LValue, "i", &pu).unwrap();
        assert_eq!(v.int_value().unwrap(), 0);
        let v =
            variable_factory(&Type::basic("main$ms"), ValueCategory::LValue, "s", &pu).unwrap();
        assert_eq!(
            v.get_data_member("a").unwrap().borrow().int_value().unwrap(),
            0
        );
        assert_eq!(
            v.get_data_member("b")
                .unwrap()
                .borrow()
                .string_value()
                .unwrap(),
            ""
        );
    }

    #[test]
    fn test_clone_keeps_type_and_value() {
        let mut v = Variable::from_string("hello");
        v.change_category(ValueCategory::LValue);
        let clone = v.clone_value();
        assert_eq!(clone.type_info(), v.type_info());
        assert_eq!(clone.string_value().unwrap(), "hello");
        // the lvalue source is untouched
        assert_eq!(v.string_value().unwrap(), "hello");
    }

    #[test]
    fn test_clone_of_rvalue_moves_payload() {
        let mut v = Variable::from_string("hello");
        let clone = v.clone_value();
        assert_eq!(clone.string_value().unwrap(), "hello");
        // the rvalue source is consumed
        assert_eq!(v.string_value().unwrap(), "");
    }

    #[test]
    fn test_assign_preserves_name_and_category() {
        let pu = test_pu();
        let mut target = variable_factory(&Type::int(), ValueCategory::LValue, "a", &pu).unwrap();
        let source = new_ref(Variable::from_int(42));
        target.assign(&source).unwrap();
        assert_eq!(target.int_value().unwrap(), 42);
        assert_eq!(target.name(), "a");
        assert_eq!(target.value_category(), ValueCategory::LValue);
    }

    #[test]
    fn test_assign_type_mismatch() {
        let mut target = Variable::from_int(1);
        let source = new_ref(Variable::from_string("x"));
        assert!(target.assign(&source).is_err());
    }

    #[test]
    fn test_compare_type_mismatch_is_error() {
        let v = Variable::from_int(1);
        let other = new_ref(Variable::from_double(1.0));
        assert!(v.compare(&other).is_err());
    }

    #[test]
    fn test_struct_construct_by_fields() {
        let pu = test_pu();
        let mut v =
            variable_factory(&Type::basic("main$ms"), ValueCategory::LValue, "s", &pu).unwrap();
        let fields = vec![
            new_ref(Variable::from_int(25)),
            new_ref(Variable::from_string("bob")),
        ];
        v.construct_by_fields(&fields, &pu).unwrap();
        assert_eq!(
            v.get_data_member("a").unwrap().borrow().int_value().unwrap(),
            25
        );
        assert_eq!(
            v.get_data_member("b")
                .unwrap()
                .borrow()
                .string_value()
                .unwrap(),
            "bob"
        );
        // wrong arity fails deterministically
        let mut v2 =
            variable_factory(&Type::basic("main$ms"), ValueCategory::LValue, "s2", &pu).unwrap();
        assert!(v2
            .construct_by_fields(&[new_ref(Variable::from_int(1))], &pu)
            .is_err());
    }

    #[test]
    fn test_pointer_identity_compare() {
        let pu = test_pu();
        let a = new_ref(variable_factory(&Type::int(), ValueCategory::LValue, "a", &pu).unwrap());
        let p1 = new_ref(Variable::pointer_rvalue(&a));
        let p2 = new_ref(Variable::pointer_rvalue(&a));
        assert!(p1.borrow().compare(&p2).unwrap());
        assert!(Rc::ptr_eq(&p1.borrow().deref().unwrap(), &a));
    }

    #[test]
    fn test_dangling_pointer_deref_fails() {
        let p = {
            let target = new_ref(Variable::from_int(5));
            Variable::pointer_rvalue(&target)
        };
        assert!(p.deref().is_err());
    }

    #[test]
    fn test_list_operations() {
        let pu = test_pu();
        let mut list =
            variable_factory(&Type::list_of(Type::int()), ValueCategory::LValue, "l", &pu)
                .unwrap();
        assert_eq!(list.list_size().unwrap(), 0);
        assert!(list.list_pop_back().is_err());
        assert!(list.list_at(0).is_err());

        list.list_push_back(new_ref(Variable::from_int(7))).unwrap();
        assert_eq!(list.list_size().unwrap(), 1);
        assert_eq!(list.list_at(0).unwrap().borrow().int_value().unwrap(), 7);

        list.list_insert(0, new_ref(Variable::from_int(3))).unwrap();
        assert_eq!(list.list_at(0).unwrap().borrow().int_value().unwrap(), 3);

        list.list_resize(4, &pu).unwrap();
        assert_eq!(list.list_size().unwrap(), 4);
        assert_eq!(list.list_at(3).unwrap().borrow().int_value().unwrap(), 0);

        list.list_erase(0).unwrap();
        assert_eq!(list.list_size().unwrap(), 3);

        list.list_clear().unwrap();
        assert_eq!(list.list_size().unwrap(), 0);
    }
}
