//! The tree-walking executor.
//!
//! The interpreter owns the merged package unit, a runtime stack of contexts
//! and a package-level context holding the globals. Statement execution
//! returns an [`ExecuteResult`] which propagates `break`, `continue` and
//! `return` up through the enclosing contexts.

pub mod inner_method;

mod error;
mod operator;
mod variable;

pub use error::{RResult, RuntimeError};
pub use operator::Operator;
pub use variable::{
    new_ref, variable_factory, FunctionValue, StructValue, Value, ValueCategory, VarRef, Variable,
};

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::ast::{
    BlockStmt, CaptureMode, Expression, Statement, VariableDefineStmt,
};
use crate::lexer::Token;
use crate::package_unit::{
    find_by_name, operator_override_name, FunctionDef, HostFunctionCheck, HostFunctionHandle,
    MethodDef, OperatorDef, PackageUnit, Param,
};
use crate::types::Type;

use inner_method::{is_inner_type, InnerTypeMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeContextKind {
    Global,
    Function,
    Callable,
    Method,
    For,
    If,
    Else,
    While,
    Block,
}

impl RuntimeContextKind {
    /// Variable lookup does not continue past function-like frames; it falls
    /// back directly to the package context instead.
    fn is_boundary(&self) -> bool {
        matches!(
            self,
            RuntimeContextKind::Function | RuntimeContextKind::Method | RuntimeContextKind::Callable
        )
    }
}

#[derive(Debug)]
pub struct RuntimeContext {
    kind: RuntimeContextKind,
    symbol_table: HashMap<String, VarRef>,
}

impl RuntimeContext {
    fn new(kind: RuntimeContextKind) -> Self {
        RuntimeContext {
            kind,
            symbol_table: HashMap::new(),
        }
    }

    fn register_variable(&mut self, variable: VarRef, name: &str) -> RResult<()> {
        if self.symbol_table.contains_key(name) {
            return Err(RuntimeError::new(format!(
                "runtime context got duplicate variable name {name}"
            )));
        }
        self.symbol_table.insert(name.to_string(), variable);
        Ok(())
    }

    fn find_variable(&self, id_name: &str) -> Option<VarRef> {
        find_by_name(&self.symbol_table, id_name).cloned()
    }
}

/// The result of executing one statement.
#[derive(Debug)]
pub enum ExecuteResult {
    Next,
    Continue,
    Break,
    Return(VarRef),
}

pub struct Interpreter {
    runtime_stack: Vec<RuntimeContext>,
    package_context: RuntimeContext,
    /// Strong owners of `alloc`ed values; `dealloc` removes entries.
    allocations: Vec<VarRef>,
    /// Keeps address-of temporaries alive until the statement completes.
    temporaries: Vec<VarRef>,
    pu: Rc<PackageUnit>,
}

impl Interpreter {
    /// Construct the interpreter and evaluate every global variable-define
    /// statement in source order.
    pub fn new(pu: PackageUnit) -> RResult<Interpreter> {
        let mut interpreter = Interpreter {
            runtime_stack: vec![],
            package_context: RuntimeContext::new(RuntimeContextKind::Global),
            allocations: vec![],
            temporaries: vec![],
            pu: Rc::new(pu),
        };
        let global_defs = interpreter.pu.global_var_def_stmts().to_vec();
        for vd in &global_defs {
            interpreter.execute_variable_define(vd)?;
            interpreter.temporaries.clear();
        }
        Ok(interpreter)
    }

    pub fn package_unit(&self) -> &PackageUnit {
        &self.pu
    }

    /// Register an embedder function; the mangled `wamon$<name>` is returned.
    /// Only possible while no call is in flight.
    pub fn register_host_function(
        &mut self,
        name: &str,
        check: HostFunctionCheck,
        handle: HostFunctionHandle,
    ) -> RResult<String> {
        match Rc::get_mut(&mut self.pu) {
            Some(pu) => Ok(pu.register_host_function(name, check, handle)),
            None => Err(RuntimeError::new(
                "register host function error, the package unit is shared",
            )),
        }
    }

    // context handling

    fn with_context<T>(
        &mut self,
        kind: RuntimeContextKind,
        f: impl FnOnce(&mut Self) -> RResult<T>,
    ) -> RResult<T> {
        self.runtime_stack.push(RuntimeContext::new(kind));
        let result = f(self);
        self.runtime_stack.pop();
        result
    }

    fn current_context_mut(&mut self) -> &mut RuntimeContext {
        match self.runtime_stack.last_mut() {
            Some(context) => context,
            None => &mut self.package_context,
        }
    }

    /// Walk the stack top-down; function-like frames fall back directly to
    /// the package context.
    fn find_variable_opt(&self, id_name: &str) -> Option<VarRef> {
        for context in self.runtime_stack.iter().rev() {
            let found = context.find_variable(id_name);
            if found.is_some() {
                return found;
            }
            if context.kind.is_boundary() {
                break;
            }
        }
        self.package_context.find_variable(id_name)
    }

    /// Find a value by id: `<package>$<name>` for globals, `__self__` for the
    /// current method receiver, bare names for locals.
    pub fn find_variable_by_id(&self, id_name: &str) -> RResult<VarRef> {
        self.find_variable_opt(id_name).ok_or_else(|| {
            RuntimeError::new(format!("find variable by id error, not found {id_name}"))
        })
    }

    /// The receiver of the innermost method call.
    pub fn get_self_object(&self) -> RResult<VarRef> {
        self.find_variable_by_id("__self__")
    }

    // invocation

    /// Call a function by (mangled) name; registered host functions win.
    pub fn call_function_by_name(&mut self, name: &str, args: Vec<VarRef>) -> RResult<VarRef> {
        let pu = Rc::clone(&self.pu);
        if pu.host_functions().find(name) {
            return self.call_host_function(name, args);
        }
        let func = pu
            .find_function(name)
            .ok_or_else(|| RuntimeError::new(format!("call function error, {name} not exist")))?;
        self.call_function(func, args)
    }

    pub fn call_function(&mut self, func: &FunctionDef, args: Vec<VarRef>) -> RResult<VarRef> {
        self.call_function_impl(func, args, None, RuntimeContextKind::Function)
    }

    fn call_function_impl(
        &mut self,
        func: &FunctionDef,
        args: Vec<VarRef>,
        captures: Option<&[VarRef]>,
        kind: RuntimeContextKind,
    ) -> RResult<VarRef> {
        debug!("call function {}", func.name);
        if args.len() != func.params.len() {
            return Err(RuntimeError::new(format!(
                "call function {} error, args count {} != {}",
                func.name,
                args.len(),
                func.params.len()
            )));
        }
        let result = self.with_context(kind, |ip| {
            ip.bind_params(&func.params, args)?;
            if let Some(captures) = captures {
                for (item, capture) in func.capture_ids.iter().zip(captures.iter()) {
                    ip.current_context_mut()
                        .register_variable(capture.clone(), &item.id)?;
                }
            }
            ip.execute_block(&func.block)
        })?;
        self.finish_call(&func.name, func.return_type.is_void(), result)
    }

    /// Call a method; the receiver is bound under the reserved `__self__`.
    pub fn call_method(
        &mut self,
        obj: VarRef,
        method: &MethodDef,
        args: Vec<VarRef>,
    ) -> RResult<VarRef> {
        let block = method.block.as_ref().ok_or_else(|| {
            RuntimeError::new(format!(
                "call method {} error, method has no body",
                method.method_name
            ))
        })?;
        if args.len() != method.params.len() {
            return Err(RuntimeError::new(format!(
                "call method {} error, args count {} != {}",
                method.method_name,
                args.len(),
                method.params.len()
            )));
        }
        let result = self.with_context(RuntimeContextKind::Method, |ip| {
            ip.bind_params(&method.params, args)?;
            ip.current_context_mut().register_variable(obj, "__self__")?;
            ip.execute_block(block)
        })?;
        self.finish_call(&method.method_name, method.return_type.is_void(), result)
    }

    /// Call a method by name. Builtin receiver types consult the inner-method
    /// table, trait values dispatch through their proxy, struct values use
    /// their definition's method table.
    pub fn call_method_by_name(
        &mut self,
        obj: VarRef,
        method_name: &str,
        args: Vec<VarRef>,
    ) -> RResult<VarRef> {
        let ty = obj.borrow().ty().clone();
        if is_inner_type(&ty) {
            let handle = *InnerTypeMethod::instance()
                .get_handle(&ty, method_name)
                .ok_or_else(|| {
                    RuntimeError::new(format!(
                        "call method error, {ty} has no method {method_name}"
                    ))
                })?;
            let pu = Rc::clone(&self.pu);
            let result =
                self.with_context(RuntimeContextKind::Method, |_| handle(&obj, args, &pu))?;
            return Ok(pass_or_clone(result));
        }
        if !ty.is_struct() {
            return Err(RuntimeError::new(format!(
                "call method error, {ty} has no methods"
            )));
        }
        let pu = Rc::clone(&self.pu);
        let struct_def = pu.find_struct(&ty.type_info()).ok_or_else(|| {
            RuntimeError::new(format!("call method error, invalid type {ty}"))
        })?;
        if struct_def.is_trait() {
            let proxy = obj.borrow().trait_proxy().ok_or_else(|| {
                RuntimeError::new(format!(
                    "call method error, trait object of {ty} has no proxy"
                ))
            })?;
            return self.call_method_by_name(proxy, method_name, args);
        }
        let method = struct_def.get_method(method_name).ok_or_else(|| {
            RuntimeError::new(format!(
                "call method error, method {ty}.{method_name} not exist"
            ))
        })?;
        self.call_method(obj, method, args)
    }

    /// Call a callable value. A receiver-carrying callable resolves the
    /// overloaded `()` on the receiver's struct by synthetic name; otherwise
    /// dispatch goes to the named function with the captures bound.
    pub fn call_callable(&mut self, callable: VarRef, args: Vec<VarRef>) -> RResult<VarRef> {
        let (func_name, obj, captures) = {
            let borrowed = callable.borrow();
            match borrowed.value() {
                Value::Function(fv) => (
                    fv.func_name.clone(),
                    fv.obj.clone(),
                    fv.captures.clone(),
                ),
                _ => {
                    return Err(RuntimeError::new(format!(
                        "call callable error, {} is not a callable",
                        borrowed.type_info()
                    )))
                }
            }
        };
        if let Some(obj) = obj {
            let arg_types = args
                .iter()
                .map(|a| a.borrow().ty().clone())
                .collect::<Vec<_>>();
            let method_name = operator_override_name("call", &arg_types);
            let type_info = obj.borrow().type_info();
            let pu = Rc::clone(&self.pu);
            let struct_def = pu.find_struct(&type_info).ok_or_else(|| {
                RuntimeError::new(format!("call callable error, invalid type {type_info}"))
            })?;
            let method = struct_def.get_method(&method_name).ok_or_else(|| {
                RuntimeError::new(format!(
                    "call callable error, {type_info} does not overload the call operator"
                ))
            })?;
            return self.call_method(obj, method, args);
        }
        let pu = Rc::clone(&self.pu);
        if pu.host_functions().find(&func_name) {
            return self.call_host_function(&func_name, args);
        }
        let func = pu.find_function(&func_name).ok_or_else(|| {
            RuntimeError::new(format!("call callable error, {func_name} not exist"))
        })?;
        self.call_function_impl(func, args, Some(&captures), RuntimeContextKind::Callable)
    }

    fn call_host_function(&mut self, name: &str, args: Vec<VarRef>) -> RResult<VarRef> {
        let pu = Rc::clone(&self.pu);
        let handle = pu.host_functions().handle(name).ok_or_else(|| {
            RuntimeError::new(format!("call host function error, {name} not exist"))
        })?;
        let result = self.with_context(RuntimeContextKind::Function, |_| handle(args))?;
        Ok(pass_or_clone(result))
    }

    /// Parameters bind to a clone of the argument (rvalue arguments are moved
    /// from); `ref` parameters share the caller's binding.
    fn bind_params(&mut self, params: &[Param], args: Vec<VarRef>) -> RResult<()> {
        for (param, arg) in params.iter().zip(args.into_iter()) {
            if param.is_ref {
                self.current_context_mut()
                    .register_variable(arg, &param.name)?;
            } else {
                let mut bound = arg.borrow_mut().clone_value();
                bound.set_name(param.name.clone());
                bound.change_category(ValueCategory::LValue);
                self.current_context_mut()
                    .register_variable(new_ref(bound), &param.name)?;
            }
        }
        Ok(())
    }

    fn finish_call(
        &mut self,
        name: &str,
        returns_void: bool,
        result: ExecuteResult,
    ) -> RResult<VarRef> {
        match result {
            ExecuteResult::Return(value) => Ok(pass_or_clone(value)),
            _ if returns_void => Ok(new_ref(Variable::void_value())),
            _ => Err(RuntimeError::new(format!(
                "call {name} error, didn't end by return stmt"
            ))),
        }
    }

    // statement execution

    fn execute_block(&mut self, block: &BlockStmt) -> RResult<ExecuteResult> {
        for stmt in &block.stmts {
            let result = self.execute_statement(stmt)?;
            self.temporaries.clear();
            if !matches!(result, ExecuteResult::Next) {
                return Ok(result);
            }
        }
        Ok(ExecuteResult::Next)
    }

    fn execute_statement(&mut self, stmt: &Statement) -> RResult<ExecuteResult> {
        match stmt {
            Statement::Block(block) => {
                self.with_context(RuntimeContextKind::Block, |ip| ip.execute_block(block))
            }
            Statement::If {
                check,
                if_block,
                else_block,
            } => {
                let check_value = self.calculate_expression(check)?;
                let check = check_value.borrow().bool_value()?;
                if check {
                    self.with_context(RuntimeContextKind::If, |ip| ip.execute_block(if_block))
                } else if let Some(else_block) = else_block {
                    self.with_context(RuntimeContextKind::Else, |ip| ip.execute_block(else_block))
                } else {
                    Ok(ExecuteResult::Next)
                }
            }
            Statement::While { check, block } => loop {
                let check_value = self.calculate_expression(check)?;
                let go_on = check_value.borrow().bool_value()?;
                self.temporaries.clear();
                if !go_on {
                    return Ok(ExecuteResult::Next);
                }
                let result =
                    self.with_context(RuntimeContextKind::While, |ip| ip.execute_block(block))?;
                match result {
                    ExecuteResult::Next | ExecuteResult::Continue => continue,
                    ExecuteResult::Break => return Ok(ExecuteResult::Next),
                    ExecuteResult::Return(_) => return Ok(result),
                }
            },
            Statement::For {
                init,
                check,
                update,
                block,
            } => self.with_context(RuntimeContextKind::For, |ip| {
                ip.calculate_expression(init)?;
                ip.temporaries.clear();
                loop {
                    let check_value = ip.calculate_expression(check)?;
                    let go_on = check_value.borrow().bool_value()?;
                    ip.temporaries.clear();
                    if !go_on {
                        return Ok(ExecuteResult::Next);
                    }
                    let result =
                        ip.with_context(RuntimeContextKind::Block, |ip| ip.execute_block(block))?;
                    match result {
                        ExecuteResult::Next | ExecuteResult::Continue => {
                            ip.calculate_expression(update)?;
                            ip.temporaries.clear();
                        }
                        ExecuteResult::Break => return Ok(ExecuteResult::Next),
                        ExecuteResult::Return(_) => return Ok(result),
                    }
                }
            }),
            Statement::Break => Ok(ExecuteResult::Break),
            Statement::Continue => Ok(ExecuteResult::Continue),
            Statement::Return(expr) => match expr {
                Some(expr) => {
                    let value = self.calculate_expression(expr)?;
                    Ok(ExecuteResult::Return(value))
                }
                None => Ok(ExecuteResult::Return(new_ref(Variable::void_value()))),
            },
            Statement::Expression(expr) => {
                self.calculate_expression(expr)?;
                Ok(ExecuteResult::Next)
            }
            Statement::VariableDefine(vd) => self.execute_variable_define(vd),
        }
    }

    fn execute_variable_define(&mut self, vd: &VariableDefineStmt) -> RResult<ExecuteResult> {
        if vd.is_ref {
            let bound = self.calculate_expression(&vd.constructors[0])?;
            self.current_context_mut()
                .register_variable(bound, &vd.var_name)?;
            return Ok(ExecuteResult::Next);
        }
        let mut fields = vec![];
        for each in &vd.constructors {
            fields.push(self.calculate_expression(each)?);
        }
        let pu = Rc::clone(&self.pu);
        let mut variable = variable_factory(&vd.ty, ValueCategory::LValue, &vd.var_name, &pu)?;
        variable.construct_by_fields(&fields, &pu)?;
        self.current_context_mut()
            .register_variable(new_ref(variable), &vd.var_name)?;
        Ok(ExecuteResult::Next)
    }

    // expression evaluation

    fn calculate_expression(&mut self, expr: &Expression) -> RResult<VarRef> {
        match expr {
            Expression::StringLiteral(v) => Ok(new_ref(Variable::from_string(v.clone()))),
            Expression::IntLiteral(v) => Ok(new_ref(Variable::from_int(*v))),
            Expression::DoubleLiteral(v) => Ok(new_ref(Variable::from_double(*v))),
            Expression::BoolLiteral(v) => Ok(new_ref(Variable::from_bool(*v))),
            Expression::ByteLiteral(v) => Ok(new_ref(Variable::from_byte(*v))),
            Expression::VoidLiteral => Ok(new_ref(Variable::void_value())),
            Expression::Id(name) => {
                if let Some(variable) = self.find_variable_opt(name) {
                    return Ok(variable);
                }
                if let Some(func) = self.pu.find_function(name) {
                    return Ok(new_ref(Variable::function(
                        func.func_type(),
                        func.name.clone(),
                        None,
                        vec![],
                    )));
                }
                Err(RuntimeError::new(format!(
                    "find variable by id error, not found {name}"
                )))
            }
            Expression::SelfObject => self.get_self_object(),
            Expression::Binary { op, left, right } => self.calculate_binary(op, left, right),
            Expression::Unary { op, operand } => self.calculate_unary(op, operand),
            Expression::FuncCall { func_name, args } => self.calculate_func_call(func_name, args),
            Expression::MethodCall {
                id_name,
                method_name,
                args,
            } => {
                let obj = self.find_variable_by_id(id_name)?;
                let mut arg_values = vec![];
                for each in args {
                    arg_values.push(self.calculate_expression(each)?);
                }
                self.call_method_by_name(obj, method_name, arg_values)
            }
            Expression::Lambda {
                func_name,
                captures,
            } => {
                let func_type = {
                    let func = self.pu.find_function(func_name).ok_or_else(|| {
                        RuntimeError::new(format!("lambda {func_name} not registered"))
                    })?;
                    func.func_type()
                };
                let mut capture_values = vec![];
                for item in captures {
                    let outer = self.find_variable_by_id(&item.id)?;
                    let capture = match item.mode {
                        CaptureMode::Ref => outer,
                        CaptureMode::Normal => new_ref(outer.borrow_mut().clone_value()),
                        CaptureMode::Move => {
                            outer.borrow_mut().change_category(ValueCategory::RValue);
                            new_ref(outer.borrow_mut().clone_value())
                        }
                    };
                    capture_values.push(capture);
                }
                Ok(new_ref(Variable::function(
                    func_type,
                    func_name.clone(),
                    None,
                    capture_values,
                )))
            }
            Expression::New { ty, args } => {
                let value = self.construct_value(ty, args, ValueCategory::RValue)?;
                Ok(new_ref(value))
            }
            Expression::Alloc { ty, args } => {
                let value = self.construct_value(ty, args, ValueCategory::LValue)?;
                let strong = new_ref(value);
                self.allocations.push(strong.clone());
                Ok(new_ref(Variable::pointer_rvalue(&strong)))
            }
            Expression::Dealloc(operand) => {
                let pointer = self.calculate_expression(operand)?;
                let target = pointer.borrow().deref().map_err(|_| {
                    RuntimeError::new("dealloc error, the object has already been destroyed")
                })?;
                let index = self
                    .allocations
                    .iter()
                    .position(|each| Rc::ptr_eq(each, &target))
                    .ok_or_else(|| {
                        RuntimeError::new("dealloc error, not an owned allocation")
                    })?;
                let type_info = target.borrow().type_info();
                let pu = Rc::clone(&self.pu);
                if let Some(struct_def) = pu.find_struct(&type_info) {
                    if let Some(method) = struct_def.get_method("destructor") {
                        self.call_method(target.clone(), method, vec![])?;
                    }
                }
                self.allocations.remove(index);
                Ok(new_ref(Variable::void_value()))
            }
            Expression::Move(id) => {
                let variable = self.find_variable_by_id(id)?;
                variable.borrow_mut().change_category(ValueCategory::RValue);
                Ok(variable)
            }
            Expression::As { operand, ty } => {
                let value = self.calculate_expression(operand)?;
                if value.borrow().type_info() == ty.type_info() {
                    return Ok(value);
                }
                Ok(new_ref(Variable::trait_object(ty.clone(), value)))
            }
        }
    }

    fn construct_value(
        &mut self,
        ty: &Type,
        args: &[Expression],
        vc: ValueCategory,
    ) -> RResult<Variable> {
        let mut fields = vec![];
        for each in args {
            fields.push(self.calculate_expression(each)?);
        }
        let pu = Rc::clone(&self.pu);
        let mut variable = variable_factory(ty, vc, "", &pu)?;
        variable.construct_by_fields(&fields, &pu)?;
        Ok(variable)
    }

    fn calculate_binary(
        &mut self,
        op: &Token,
        left: &Expression,
        right: &Expression,
    ) -> RResult<VarRef> {
        if *op == Token::MemberAccess {
            let object = self.calculate_expression(left)?;
            let Expression::Id(field) = right else {
                return Err(RuntimeError::new(
                    "member access error, right operand is not an id",
                ));
            };
            let member = object.borrow().get_data_member(field)?;
            return Ok(member);
        }
        if *op == Token::Subscript {
            let object = self.calculate_expression(left)?;
            let index_value = self.calculate_expression(right)?;
            let index = index_value.borrow().int_value()?;
            let element = object.borrow().list_at(index)?;
            return Ok(element);
        }
        // sub-expressions evaluate left to right; && and || evaluate both
        // operands
        let left_value = self.calculate_expression(left)?;
        let right_value = self.calculate_expression(right)?;
        if *op == Token::Assign {
            if !Rc::ptr_eq(&left_value, &right_value) {
                left_value.borrow_mut().assign(&right_value)?;
            }
            return Ok(new_ref(Variable::void_value()));
        }
        if *op == Token::Compare {
            let equal = left_value.borrow().compare(&right_value)?;
            return Ok(new_ref(Variable::from_bool(equal)));
        }
        self.calculate_operator(op, left_value, right_value)
    }

    /// Builtin handlers win; only on a miss is a user defined overload with
    /// the matching synthetic name looked up.
    fn calculate_operator(
        &mut self,
        op: &Token,
        left: VarRef,
        right: VarRef,
    ) -> RResult<VarRef> {
        if let Some(result) = Operator::instance().calculate_binary(op, &left, &right) {
            return result.map(new_ref);
        }
        let operands = [
            left.borrow().ty().clone(),
            right.borrow().ty().clone(),
        ];
        let override_name = operator_override_name(OperatorDef::op_str(op), &operands);
        let pu = Rc::clone(&self.pu);
        if let Some(func) = pu.find_function(&override_name) {
            return self.call_function(func, vec![left, right]);
        }
        Err(RuntimeError::new(format!(
            "operator {} calculate error, handle not exist",
            op.token_str()
        )))
    }

    fn calculate_unary(&mut self, op: &Token, operand: &Expression) -> RResult<VarRef> {
        let value = self.calculate_expression(operand)?;
        match op {
            Token::AddressOf => {
                let pointer = Variable::pointer_rvalue(&value);
                // the referent must outlive the pointer until the statement ends
                self.temporaries.push(value);
                Ok(new_ref(pointer))
            }
            Token::Multiply => value.borrow().deref(),
            _ => match Operator::instance().calculate_unary(op, &value) {
                Some(result) => result.map(new_ref),
                None => Err(RuntimeError::new(format!(
                    "operator {} calculate error, handle not exist",
                    op.token_str()
                ))),
            },
        }
    }

    /// The ordered call resolution: a visible callable-typed identifier, then
    /// an implicit method on the first argument, then a free function, then a
    /// registered host function.
    fn calculate_func_call(
        &mut self,
        func_name: &str,
        args: &[Expression],
    ) -> RResult<VarRef> {
        let mut arg_values = vec![];
        for each in args {
            arg_values.push(self.calculate_expression(each)?);
        }

        if let Some(variable) = self.find_variable_opt(func_name) {
            if variable.borrow().ty().is_func() {
                return self.call_callable(variable, arg_values);
            }
        }

        if let Some(first) = arg_values.first() {
            let first_type = first.borrow().ty().clone();
            if first_type.is_struct()
                && self
                    .pu
                    .find_type_method(&first_type.type_info(), func_name)
                    .is_some()
            {
                let obj = arg_values.remove(0);
                // trait receivers dispatch through their proxy
                return self.call_method_by_name(obj, func_name, arg_values);
            }
        }

        let pu = Rc::clone(&self.pu);
        if let Some(func) = pu.find_function(func_name) {
            return self.call_function(func, arg_values);
        }
        if pu.host_functions().find(func_name) {
            return self.call_host_function(func_name, arg_values);
        }
        Err(RuntimeError::new(format!(
            "call error, unknown name {func_name}"
        )))
    }
}

fn pass_or_clone(value: VarRef) -> VarRef {
    let is_rvalue = value.borrow().is_rvalue();
    if is_rvalue {
        value
    } else {
        new_ref(value.borrow_mut().clone_value())
    }
}
