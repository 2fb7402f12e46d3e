//! Definitions grouped by package: global variables, functions, structs and
//! their methods, plus the host-function registry and the merge step that
//! produces the canonical unit the executor consumes.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{BlockStmt, CaptureIdItem, VariableDefineStmt};
use crate::interpreter::{RuntimeError, VarRef};
use crate::lexer::Token;
use crate::parser::ParseError;
use crate::types::{get_type_list_id, is_same_type, Type};

/// One declared parameter. `is_ref` parameters share the caller's binding
/// instead of receiving a clone.
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: Type,
    pub name: String,
    pub is_ref: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub block: BlockStmt,
    /// Non-empty only for lowered lambdas.
    pub capture_ids: Vec<CaptureIdItem>,
}

impl FunctionDef {
    pub fn func_type(&self) -> Type {
        Type::func(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.return_type.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub method_name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    /// `None` for the body-less declarations of a struct trait.
    pub block: Option<BlockStmt>,
}

impl MethodDef {
    pub fn func_type(&self) -> Type {
        Type::func(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.return_type.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct StructDef {
    name: String,
    is_trait: bool,
    data_members: Vec<(String, Type)>,
    methods: Vec<MethodDef>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, is_trait: bool) -> Self {
        StructDef {
            name: name.into(),
            is_trait,
            data_members: vec![],
            methods: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_trait(&self) -> bool {
        self.is_trait
    }

    pub fn add_data_member(&mut self, name: impl Into<String>, ty: Type) -> Result<(), String> {
        let name = name.into();
        if self.data_members.iter().any(|(n, _)| *n == name) {
            return Err(format!("duplicate field {} in type {}", name, self.name));
        }
        self.data_members.push((name, ty));
        Ok(())
    }

    pub fn add_method(&mut self, method: MethodDef) -> Result<(), String> {
        if self.get_method(&method.method_name).is_some() {
            return Err(format!(
                "duplicate method {} in type {}",
                method.method_name, self.name
            ));
        }
        self.methods.push(method);
        Ok(())
    }

    /// Field order is the canonical construction order.
    pub fn data_members(&self) -> &[(String, Type)] {
        &self.data_members
    }

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    pub fn get_method(&self, method_name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.method_name == method_name)
    }

    pub fn get_data_member_type(&self, field_name: &str) -> Option<&Type> {
        self.data_members
            .iter()
            .find(|(n, _)| n == field_name)
            .map(|(_, t)| t)
    }

    /// The struct names this struct depends on, i.e. every struct mentioned
    /// anywhere in a field's type.
    pub fn dependent(&self) -> Vec<String> {
        let mut names = vec![];
        for (_, ty) in &self.data_members {
            ty.collect_struct_names(&mut names);
        }
        names
    }
}

/// The synthetic name of an operator overload, derived purely from the
/// operator identity and the parameter type list.
pub fn operator_override_name(op_str: &str, param_types: &[Type]) -> String {
    format!("__op_{}_{}", op_str, get_type_list_id(param_types))
}

/// A parsed `operator` declaration, lowered into a specially named function
/// (free overloads) or method (`operator ()` inside a method block).
#[derive(Debug, Clone)]
pub struct OperatorDef {
    pub op: Token,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub block: BlockStmt,
}

impl OperatorDef {
    pub fn op_str(op: &Token) -> &'static str {
        if *op == Token::LeftParen {
            "call"
        } else {
            op.token_str()
        }
    }

    pub fn can_be_overridden(op: &Token) -> bool {
        matches!(
            op,
            Token::Plus
                | Token::Minus
                | Token::Multiply
                | Token::Divide
                | Token::And
                | Token::Or
                | Token::Compare
                | Token::LeftParen
        )
    }

    pub fn create_name(&self) -> String {
        let types = self.params.iter().map(|p| p.ty.clone()).collect::<Vec<_>>();
        operator_override_name(Self::op_str(&self.op), &types)
    }

    pub fn is_operator_override_name(name: &str) -> bool {
        name.starts_with("__op_")
    }

    pub fn into_function(self) -> FunctionDef {
        let name = self.create_name();
        FunctionDef {
            name,
            params: self.params,
            return_type: self.return_type,
            block: self.block,
            capture_ids: vec![],
        }
    }

    pub fn into_method(self) -> MethodDef {
        let name = self.create_name();
        MethodDef {
            method_name: name,
            params: self.params,
            return_type: self.return_type,
            block: Some(self.block),
        }
    }
}

pub fn is_lambda_name(name: &str) -> bool {
    name.contains("$__lambda_")
}

/// Identifiers beginning with two underscores are reserved for the
/// implementation (`__self__`, `__op_...`).
pub fn is_reserved_id(id: &str) -> bool {
    id.starts_with("__")
}

pub type HostFunctionCheck = Box<dyn Fn(&[Type]) -> Result<Type, String>>;
pub type HostFunctionHandle = Box<dyn Fn(Vec<VarRef>) -> Result<VarRef, RuntimeError>>;

/// Registry of embedder-provided functions, addressed from scripts as
/// `wamon::<name>` and stored under the mangled `wamon$<name>`.
#[derive(Default)]
pub struct HostFunctions {
    checks: HashMap<String, HostFunctionCheck>,
    handles: HashMap<String, HostFunctionHandle>,
}

impl fmt::Debug for HostFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.handles.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("HostFunctions").field("names", &names).finish()
    }
}

impl HostFunctions {
    pub fn register(
        &mut self,
        mangled_name: String,
        check: HostFunctionCheck,
        handle: HostFunctionHandle,
    ) {
        self.checks.insert(mangled_name.clone(), check);
        self.handles.insert(mangled_name, handle);
    }

    pub fn find(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    pub fn type_check(&self, name: &str, args: &[Type]) -> Result<Type, String> {
        let check = self
            .checks
            .get(name)
            .ok_or_else(|| format!("host function {name} not registered"))?;
        check(args)
    }

    pub fn handle(&self, name: &str) -> Option<&HostFunctionHandle> {
        self.handles.get(name)
    }

    fn absorb(&mut self, other: HostFunctions) {
        self.checks.extend(other.checks);
        self.handles.extend(other.handles);
    }
}

/// Look up `name` in a mangled table: exact match first, then a unique
/// `<package>$name` suffix match for bare references. An ambiguous bare name
/// resolves to nothing; scripts disambiguate with `package::name`.
pub fn find_by_name<'a, V>(map: &'a HashMap<String, V>, name: &str) -> Option<&'a V> {
    if let Some(v) = map.get(name) {
        return Some(v);
    }
    if name.contains('$') {
        return None;
    }
    let suffix = format!("${name}");
    let mut matches = map.iter().filter(|(k, _)| k.ends_with(&suffix));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first.1)
}

/// The unit of parsing: one package's globals, functions, structs and
/// methods. Definition names carry their `<package>$` qualification already;
/// [`merge_package_units`] validates that no names collide and produces the
/// single canonical unit the type checker and executor consume.
#[derive(Debug, Default)]
pub struct PackageUnit {
    package_name: String,
    import_packages: Vec<String>,
    var_defs: Vec<VariableDefineStmt>,
    funcs: HashMap<String, FunctionDef>,
    structs: HashMap<String, StructDef>,
    host_functions: HostFunctions,
    lambda_count: usize,
}

impl PackageUnit {
    pub fn new() -> Self {
        PackageUnit::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.package_name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.package_name
    }

    pub fn set_import_packages(&mut self, imports: Vec<String>) {
        self.import_packages = imports;
    }

    pub fn import_packages(&self) -> &[String] {
        &self.import_packages
    }

    pub fn add_var_def(&mut self, vd: VariableDefineStmt) {
        self.var_defs.push(vd);
    }

    pub fn add_func_def(&mut self, func_def: FunctionDef) -> Result<(), String> {
        let name = func_def.name.clone();
        if self.funcs.contains_key(&name) {
            return Err(format!("duplicate function name {name}"));
        }
        self.funcs.insert(name, func_def);
        Ok(())
    }

    pub fn add_struct_def(&mut self, struct_def: StructDef) -> Result<(), String> {
        let name = struct_def.name().to_string();
        if self.structs.contains_key(&name) {
            return Err(format!("duplicate struct name {name}"));
        }
        self.structs.insert(name, struct_def);
        Ok(())
    }

    pub fn add_method(&mut self, type_name: &str, method: MethodDef) -> Result<(), String> {
        match self.structs.get_mut(type_name) {
            Some(struct_def) => struct_def.add_method(method),
            None => Err(format!("add method error, invalid type : {type_name}")),
        }
    }

    /// The ordered global variable-define statements of the unit.
    pub fn global_var_def_stmts(&self) -> &[VariableDefineStmt] {
        &self.var_defs
    }

    pub fn funcs(&self) -> &HashMap<String, FunctionDef> {
        &self.funcs
    }

    pub fn structs(&self) -> &HashMap<String, StructDef> {
        &self.structs
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionDef> {
        find_by_name(&self.funcs, name)
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        find_by_name(&self.structs, name)
    }

    pub fn find_type_method(&self, type_name: &str, method_name: &str) -> Option<&MethodDef> {
        self.find_struct(type_name)?.get_method(method_name)
    }

    pub fn get_data_member_type(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Result<Type, String> {
        let struct_def = self
            .find_struct(type_name)
            .ok_or_else(|| format!("invalid struct type {type_name}"))?;
        struct_def
            .get_data_member_type(field_name)
            .cloned()
            .ok_or_else(|| format!("field {field_name} not exist in type {type_name}"))
    }

    /// The next synthetic lambda name; the package name is baked in so merge
    /// leaves lambdas untouched.
    pub fn next_lambda_name(&mut self) -> String {
        let name = format!("{}$__lambda_{}", self.package_name, self.lambda_count);
        self.lambda_count += 1;
        name
    }

    /// Register an embedder function. The returned mangled name is
    /// `wamon$<name>`, addressed from scripts as `wamon::<name>`.
    pub fn register_host_function(
        &mut self,
        name: &str,
        check: HostFunctionCheck,
        handle: HostFunctionHandle,
    ) -> String {
        let mangled = format!("wamon${name}");
        self.host_functions.register(mangled.clone(), check, handle);
        mangled
    }

    /// Convenience registration: the check callback is derived from a
    /// function type by positional comparison.
    pub fn register_host_function_by_type(
        &mut self,
        name: &str,
        func_type: Type,
        handle: HostFunctionHandle,
    ) -> Result<String, String> {
        let (params, ret) = match &func_type {
            Type::Func { params, ret } => (params.clone(), ret.as_ref().clone()),
            _ => {
                return Err(format!(
                    "register host function error, {} has non-function type {}",
                    name,
                    func_type.type_info()
                ))
            }
        };
        let reg_name = name.to_string();
        let check = Box::new(move |args: &[Type]| -> Result<Type, String> {
            if args.len() != params.len() {
                return Err(format!(
                    "host function {} needs {} params, got {}",
                    reg_name,
                    params.len(),
                    args.len()
                ));
            }
            for (i, (param, arg)) in params.iter().zip(args.iter()).enumerate() {
                if !is_same_type(param, arg) {
                    return Err(format!(
                        "host function {} {}th param type mismatch : {} != {}",
                        reg_name,
                        i,
                        param.type_info(),
                        arg.type_info()
                    ));
                }
            }
            Ok(ret.clone())
        });
        Ok(self.register_host_function(name, check, handle))
    }

    pub fn host_functions(&self) -> &HostFunctions {
        &self.host_functions
    }
}

/// Merge several parsed units into the canonical unit. Definition names are
/// already package qualified; merging validates that nothing collides
/// (operator overloads excepted, which may legitimately repeat per type but
/// not per signature) and keeps global definitions in source order.
pub fn merge_package_units(units: Vec<PackageUnit>) -> Result<PackageUnit, ParseError> {
    let mut result = PackageUnit::new();
    for unit in units {
        for vd in unit.var_defs {
            if result
                .var_defs
                .iter()
                .any(|existing| existing.var_name == vd.var_name)
            {
                return Err(ParseError::new(format!(
                    "merge error, duplicate global variable {}",
                    vd.var_name
                )));
            }
            result.var_defs.push(vd);
        }
        for (name, func) in unit.funcs {
            if result.funcs.contains_key(&name) {
                return Err(ParseError::new(format!(
                    "merge error, duplicate function {name}"
                )));
            }
            result.funcs.insert(name, func);
        }
        for (name, struct_def) in unit.structs {
            if result.structs.contains_key(&name) {
                return Err(ParseError::new(format!(
                    "merge error, duplicate struct {name}"
                )));
            }
            result.structs.insert(name, struct_def);
        }
        result
            .import_packages
            .extend(unit.import_packages.into_iter());
        result.host_functions.absorb(unit.host_functions);
    }
    Ok(result)
}
