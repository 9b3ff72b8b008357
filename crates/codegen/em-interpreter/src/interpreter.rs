//! Module interpreter

#![allow(
    clippy::min_ident_chars,
    reason = "Short identifiers like op, l, r are conventional in operator implementations"
)]

use crate::value::Value;
use em_ir::{
    BinaryOp, Constant, FloatPredicate, Function, FunctionId, InstId, InstKind, IntPredicate, Module,
    Terminator, Value as Operand,
};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

/// Deepest call nesting before execution is aborted
const MAX_CALL_DEPTH: usize = 256;

/// Interpreter error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpreterError {
    /// Called name is not a function of the module
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// Declared function with no registered host implementation
    #[error("external function `{0}` has no host implementation")]
    UnresolvedExternal(String),
    /// Call with the wrong number of arguments
    #[error("`{function}` expects {expected} arguments, got {found}")]
    ArityMismatch {
        /// Called function
        function: String,
        /// Parameter count
        expected: usize,
        /// Argument count
        found: usize,
    },
    /// Load from a slot that was never stored to
    #[error("read of uninitialized slot {0}")]
    UninitializedRead(usize),
    /// Load or store through something that is not a slot address
    #[error("invalid pointer: {0}")]
    InvalidPointer(String),
    /// Type mismatch
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Got type
        got: String,
    },
    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,
    /// Defined function whose entry block never returns
    #[error("entry block of `{0}` has no terminator")]
    MissingTerminator(String),
    /// Call nesting exceeded the limit
    #[error("call depth exceeded {0}")]
    StackOverflow(usize),
    /// Invalid operation
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Native implementation of a declared function
pub type HostFunction = Box<dyn Fn(&[Value]) -> Result<Value, InterpreterError>>;

/// Runtime string concatenation: `ptr (ptr, ptr)`
///
/// # Errors
/// Fails unless called with exactly two strings
pub fn builtin_concat(args: &[Value]) -> Result<Value, InterpreterError> {
    match args {
        [Value::String(l), Value::String(r)] => Ok(Value::String(format!("{l}{r}"))),
        [l, r] => Err(InterpreterError::TypeMismatch {
            expected: "two strings".to_owned(),
            got: format!("{l:?}, {r:?}"),
        }),
        _ => Err(InterpreterError::ArityMismatch {
            function: "concat".to_owned(),
            expected: 2,
            found: args.len(),
        }),
    }
}

/// Activation of one defined function
struct Frame<'a> {
    function: &'a Function,
    args: Vec<Value>,
    results: FxHashMap<InstId, Value>,
}

/// Interpreter state
///
/// Slots are allocated on a single stack that is unwound when a call returns.
pub struct Interpreter<'m> {
    module: &'m Module,
    host: FxHashMap<String, HostFunction>,
    memory: Vec<Option<Value>>,
    depth: usize,
}

impl<'m> Interpreter<'m> {
    /// Create an interpreter for `module` with the builtin `concat` routine
    #[must_use]
    pub fn new(module: &'m Module) -> Self {
        let mut interpreter = Self {
            module,
            host: FxHashMap::default(),
            memory: Vec::new(),
            depth: 0,
        };
        interpreter.register_host("concat", builtin_concat);
        interpreter
    }

    /// Provide the implementation of an external function
    ///
    /// Replaces any earlier registration under the same name.
    pub fn register_host(
        &mut self,
        name: impl Into<String>,
        function: impl Fn(&[Value]) -> Result<Value, InterpreterError> + 'static,
    ) {
        self.host.insert(name.into(), Box::new(function));
    }

    /// Call a function of the module by name
    ///
    /// # Errors
    /// Returns `InterpreterError` if execution fails
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, InterpreterError> {
        let id = self
            .module
            .get_function(name)
            .ok_or_else(|| InterpreterError::UnknownFunction(name.to_owned()))?;
        self.call_function(id, args)
    }

    /// Call a function of the module by id
    ///
    /// # Errors
    /// Returns `InterpreterError` if execution fails
    pub fn call_function(&mut self, id: FunctionId, args: Vec<Value>) -> Result<Value, InterpreterError> {
        let module = self.module;
        let function = module.function(id);
        if !function.signature.accepts_arity(args.len()) {
            return Err(InterpreterError::ArityMismatch {
                function: function.name.clone(),
                expected: function.signature.params.len(),
                found: args.len(),
            });
        }

        if function.is_declaration() {
            let host = self
                .host
                .get(&function.name)
                .ok_or_else(|| InterpreterError::UnresolvedExternal(function.name.clone()))?;
            trace!(function = %function.name, "calling host function");
            return host(&args);
        }

        if self.depth >= MAX_CALL_DEPTH {
            return Err(InterpreterError::StackOverflow(MAX_CALL_DEPTH));
        }
        self.depth += 1;
        let base = self.memory.len();
        let result = self.execute(function, args);
        self.memory.truncate(base);
        self.depth -= 1;
        result
    }

    /// Execute the entry block of a defined function
    fn execute(&mut self, function: &'m Function, args: Vec<Value>) -> Result<Value, InterpreterError> {
        trace!(function = %function.name, "executing");
        let mut frame = Frame {
            function,
            args,
            results: FxHashMap::default(),
        };

        // There are no branches, so control never leaves the entry block;
        // later blocks hold code emitted after a `ret`.
        let entry = function
            .blocks()
            .first()
            .ok_or_else(|| InterpreterError::MissingTerminator(function.name.clone()))?;
        for &id in &entry.instructions {
            let value = self.execute_instruction(&frame, id)?;
            frame.results.insert(id, value);
        }

        match &entry.terminator {
            Some(Terminator::Return(Some(value))) => self.eval_operand(&frame, value),
            Some(Terminator::Return(None)) => Ok(Value::Unit),
            Some(Terminator::Unreachable) => Err(InterpreterError::InvalidOperation(format!(
                "`{}` reached unreachable code",
                function.name
            ))),
            None => Err(InterpreterError::MissingTerminator(function.name.clone())),
        }
    }

    fn execute_instruction(&mut self, frame: &Frame<'m>, id: InstId) -> Result<Value, InterpreterError> {
        let instruction = frame.function.instruction(id);
        match &instruction.kind {
            InstKind::Alloca { .. } => {
                self.memory.push(None);
                Ok(Value::Pointer(self.memory.len() - 1))
            }
            InstKind::Load { ptr } => {
                let slot = self.slot(frame, ptr)?;
                self.memory
                    .get(slot)
                    .cloned()
                    .flatten()
                    .ok_or(InterpreterError::UninitializedRead(slot))
            }
            InstKind::Store { value, ptr } => {
                let value = self.eval_operand(frame, value)?;
                let slot = self.slot(frame, ptr)?;
                let cell = self
                    .memory
                    .get_mut(slot)
                    .ok_or_else(|| InterpreterError::InvalidPointer(format!("slot {slot} is out of range")))?;
                *cell = Some(value);
                Ok(Value::Unit)
            }
            InstKind::Binary { op, lhs, rhs } => {
                let l = self.eval_operand(frame, lhs)?;
                let r = self.eval_operand(frame, rhs)?;
                eval_binary_op(*op, l, r)
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                let l = self.eval_operand(frame, lhs)?;
                let r = self.eval_operand(frame, rhs)?;
                eval_int_compare(*pred, &l, &r)
            }
            InstKind::FCmp { pred, lhs, rhs } => {
                let l = self.eval_operand(frame, lhs)?;
                let r = self.eval_operand(frame, rhs)?;
                eval_float_compare(*pred, &l, &r)
            }
            InstKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval_operand(frame, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_function(*callee, args)
            }
        }
    }

    fn slot(&self, frame: &Frame<'m>, ptr: &Operand) -> Result<usize, InterpreterError> {
        match self.eval_operand(frame, ptr)? {
            Value::Pointer(slot) => Ok(slot),
            other => Err(InterpreterError::InvalidPointer(format!("{other} is not a slot address"))),
        }
    }

    fn eval_operand(&self, frame: &Frame<'m>, operand: &Operand) -> Result<Value, InterpreterError> {
        match operand {
            Operand::Const(constant) => Ok(eval_constant(*constant)),
            Operand::Param(index) => frame
                .args
                .get(*index as usize)
                .cloned()
                .ok_or_else(|| InterpreterError::InvalidOperation(format!("no argument {index}"))),
            Operand::Inst(id) => frame.results.get(id).cloned().ok_or_else(|| {
                InterpreterError::InvalidOperation(format!(
                    "instruction {} used before it was executed",
                    u32::from(id.into_raw())
                ))
            }),
            Operand::Global(id) => Ok(Value::String(self.module.global(*id).value.clone())),
        }
    }
}

fn eval_constant(constant: Constant) -> Value {
    match constant {
        Constant::Int(i) => Value::Int(i),
        Constant::Float(f) => Value::Float(f),
        Constant::Bool(b) => Value::Bool(b),
        Constant::Null => Value::Null,
    }
}

fn eval_binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value, InterpreterError> {
    match (op, left, right) {
        // Integer operations wrap like their machine counterparts
        (BinaryOp::Add, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_add(r))),
        (BinaryOp::Sub, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_sub(r))),
        (BinaryOp::Mul, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_mul(r))),
        (BinaryOp::SDiv, Value::Int(_), Value::Int(0)) => Err(InterpreterError::DivisionByZero),
        (BinaryOp::SDiv, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_div(r))),

        // One-bit integers
        (BinaryOp::Add | BinaryOp::Sub, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l ^ r)),
        (BinaryOp::Mul, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l & r)),
        (BinaryOp::SDiv, Value::Bool(_), Value::Bool(false)) => Err(InterpreterError::DivisionByZero),
        (BinaryOp::SDiv, Value::Bool(l), Value::Bool(true)) => Ok(Value::Bool(l)),

        // Float operations
        (BinaryOp::FAdd, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l + r)),
        (BinaryOp::FSub, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l - r)),
        (BinaryOp::FMul, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l * r)),
        (BinaryOp::FDiv, Value::Float(l), Value::Float(r)) => Ok(Value::Float(l / r)),

        (op, left, right) => Err(InterpreterError::TypeMismatch {
            expected: format!("operands for `{}`", op.mnemonic()),
            got: format!("{left:?}, {right:?}"),
        }),
    }
}

fn eval_int_compare(pred: IntPredicate, left: &Value, right: &Value) -> Result<Value, InterpreterError> {
    let (l, r) = match (left, right) {
        (Value::Int(l), Value::Int(r)) => (*l, *r),
        // `i1` is signed: true is -1
        (Value::Bool(l), Value::Bool(r)) => (-i64::from(*l), -i64::from(*r)),
        _ => {
            return Err(InterpreterError::TypeMismatch {
                expected: "integer operands for `icmp`".to_owned(),
                got: format!("{left:?}, {right:?}"),
            });
        }
    };
    let result = match pred {
        IntPredicate::Eq => l == r,
        IntPredicate::Ne => l != r,
        IntPredicate::Slt => l < r,
        IntPredicate::Sgt => l > r,
        IntPredicate::Sle => l <= r,
        IntPredicate::Sge => l >= r,
    };
    Ok(Value::Bool(result))
}

#[allow(clippy::float_cmp, reason = "Direct float comparison is intentional for interpreter semantics")]
fn eval_float_compare(pred: FloatPredicate, left: &Value, right: &Value) -> Result<Value, InterpreterError> {
    let (Value::Float(l), Value::Float(r)) = (left, right) else {
        return Err(InterpreterError::TypeMismatch {
            expected: "floating-point operands for `fcmp`".to_owned(),
            got: format!("{left:?}, {right:?}"),
        });
    };
    // Ordered predicates are false whenever either operand is NaN
    let result = match pred {
        FloatPredicate::Oeq => l == r,
        FloatPredicate::One => !l.is_nan() && !r.is_nan() && l != r,
        FloatPredicate::Olt => l < r,
        FloatPredicate::Ogt => l > r,
        FloatPredicate::Ole => l <= r,
        FloatPredicate::Oge => l >= r,
    };
    Ok(Value::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use em_ir::{Builder, IrType, Linkage, Signature, Value as Operand};

    fn define(module: &mut Module, name: &str, params: Vec<IrType>, ret: IrType) -> Builder {
        let function = module
            .add_function(name, Signature::new(params, ret, false), Linkage::External)
            .unwrap();
        let entry = module.function_mut(function).append_block("entry");
        let mut builder = Builder::new();
        builder.position_at_end(function, entry);
        builder
    }

    #[test]
    fn test_arithmetic_on_parameters() {
        let mut module = Module::new("test");
        let mut builder = define(&mut module, "add", vec![IrType::I64, IrType::I64], IrType::I64);
        let sum = builder
            .build_int_binop(&mut module, BinaryOp::Add, Operand::Param(0), Operand::Param(1), "")
            .unwrap();
        builder.build_return(&mut module, Some(sum)).unwrap();

        let mut interpreter = Interpreter::new(&module);
        let result = interpreter.call("add", vec![Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn test_uninitialized_read_fails() {
        let mut module = Module::new("test");
        let mut builder = define(&mut module, "f", vec![], IrType::I64);
        let slot = builder.build_alloca(&mut module, IrType::I64, "x").unwrap();
        let loaded = builder.build_load(&mut module, IrType::I64, slot, "x").unwrap();
        builder.build_return(&mut module, Some(loaded)).unwrap();

        let mut interpreter = Interpreter::new(&module);
        assert_eq!(
            interpreter.call("f", Vec::new()),
            Err(InterpreterError::UninitializedRead(0))
        );
    }

    #[test]
    fn test_store_then_load() {
        let mut module = Module::new("test");
        let mut builder = define(&mut module, "f", vec![], IrType::F64);
        let slot = builder.build_alloca(&mut module, IrType::F64, "x").unwrap();
        builder.build_store(&mut module, Operand::float(2.5), slot).unwrap();
        let loaded = builder.build_load(&mut module, IrType::F64, slot, "x").unwrap();
        builder.build_return(&mut module, Some(loaded)).unwrap();

        let mut interpreter = Interpreter::new(&module);
        assert_eq!(interpreter.call("f", Vec::new()), Ok(Value::Float(2.5)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            eval_binary_op(BinaryOp::SDiv, Value::Int(1), Value::Int(0)),
            Err(InterpreterError::DivisionByZero)
        );
        assert_eq!(
            eval_binary_op(BinaryOp::FDiv, Value::Float(1.0), Value::Float(0.0)),
            Ok(Value::Float(f64::INFINITY))
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            eval_int_compare(IntPredicate::Slt, &Value::Int(-1), &Value::Int(1)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval_float_compare(FloatPredicate::One, &Value::Float(f64::NAN), &Value::Float(1.0)),
            Ok(Value::Bool(false))
        );
        assert!(eval_int_compare(IntPredicate::Eq, &Value::Int(1), &Value::Float(1.0)).is_err());
    }

    #[test]
    fn test_external_calls_use_host_functions() {
        let mut module = Module::new("test");
        let concat = module
            .add_function(
                "concat",
                Signature::new(vec![IrType::Ptr, IrType::Ptr], IrType::Ptr, false),
                Linkage::External,
            )
            .unwrap();
        module
            .add_function("missing", Signature::new(vec![], IrType::Void, false), Linkage::External)
            .unwrap();
        let left = module.add_global_string("ab");
        let right = module.add_global_string("c");
        let mut builder = define(&mut module, "f", vec![], IrType::Ptr);
        let joined = builder
            .build_call(&mut module, concat, &[Operand::Global(left), Operand::Global(right)], "")
            .unwrap();
        builder.build_return(&mut module, Some(joined)).unwrap();

        let mut interpreter = Interpreter::new(&module);
        assert_eq!(interpreter.call("f", Vec::new()), Ok(Value::String("abc".to_owned())));
        assert_eq!(
            interpreter.call("missing", Vec::new()),
            Err(InterpreterError::UnresolvedExternal("missing".to_owned()))
        );

        interpreter.register_host("missing", |_| Ok(Value::Unit));
        assert_eq!(interpreter.call("missing", Vec::new()), Ok(Value::Unit));
    }

    #[test]
    fn test_unbounded_recursion_is_stopped() {
        let mut module = Module::new("test");
        let mut builder = define(&mut module, "f", vec![], IrType::I64);
        let f = module.get_function("f").unwrap();
        let result = builder.build_call(&mut module, f, &[], "").unwrap();
        builder.build_return(&mut module, Some(result)).unwrap();

        let mut interpreter = Interpreter::new(&module);
        assert_eq!(
            interpreter.call("f", Vec::new()),
            Err(InterpreterError::StackOverflow(MAX_CALL_DEPTH))
        );
    }

    #[test]
    fn test_arity_is_checked() {
        let mut module = Module::new("test");
        let mut builder = define(&mut module, "id", vec![IrType::I64], IrType::I64);
        builder.build_return(&mut module, Some(Operand::Param(0))).unwrap();

        let mut interpreter = Interpreter::new(&module);
        assert!(matches!(
            interpreter.call("id", Vec::new()),
            Err(InterpreterError::ArityMismatch { expected: 1, found: 0, .. })
        ));
        assert_eq!(
            interpreter.call("nope", Vec::new()),
            Err(InterpreterError::UnknownFunction("nope".to_owned()))
        );
    }
}
