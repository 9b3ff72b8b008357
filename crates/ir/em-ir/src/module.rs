//! Module, function and instruction data structures

use crate::error::BuilderError;
use crate::types::IrType;
use crate::value::Value;
use indexmap::IndexMap;
use la_arena::{Arena, Idx};

/// Function handle within a module
pub type FunctionId = Idx<Function>;

/// String global handle within a module
pub type GlobalId = Idx<GlobalString>;

/// Instruction handle within a function
pub type InstId = Idx<Instruction>;

/// Basic block index within a function
pub type BlockId = usize;

/// Symbol visibility of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Only visible inside the module
    Internal,
    /// Visible to the linker
    External,
}

/// Function type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Declared parameter types
    pub params: Vec<IrType>,
    /// Return type, `Void` for procedures
    pub ret: IrType,
    /// Whether extra trailing arguments are accepted
    pub variadic: bool,
}

impl Signature {
    /// Create a signature
    #[must_use]
    pub fn new(params: Vec<IrType>, ret: IrType, variadic: bool) -> Self {
        Self {
            params,
            ret,
            variadic,
        }
    }

    /// Whether a call with `count` arguments matches this signature
    #[must_use]
    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.params.len()
        } else {
            count == self.params.len()
        }
    }
}

/// Null-terminated string constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalString {
    /// Symbol name, e.g. `.str.0`
    pub name: String,
    /// Contents without the terminator
    pub value: String,
}

/// Integer and floating-point arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Integer addition
    Add,
    /// Integer subtraction
    Sub,
    /// Integer multiplication
    Mul,
    /// Signed integer division
    SDiv,
    /// Float addition
    FAdd,
    /// Float subtraction
    FSub,
    /// Float multiplication
    FMul,
    /// Float division
    FDiv,
}

impl BinaryOp {
    /// Whether the operation works on floats
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::FAdd | Self::FSub | Self::FMul | Self::FDiv)
    }

    /// Textual mnemonic
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::SDiv => "sdiv",
            Self::FAdd => "fadd",
            Self::FSub => "fsub",
            Self::FMul => "fmul",
            Self::FDiv => "fdiv",
        }
    }
}

/// Signed integer comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// signed `<`
    Slt,
    /// signed `>`
    Sgt,
    /// signed `<=`
    Sle,
    /// signed `>=`
    Sge,
}

impl IntPredicate {
    /// Textual mnemonic
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Slt => "slt",
            Self::Sgt => "sgt",
            Self::Sle => "sle",
            Self::Sge => "sge",
        }
    }
}

/// Ordered float comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatPredicate {
    /// ordered `==`
    Oeq,
    /// ordered `!=`
    One,
    /// ordered `<`
    Olt,
    /// ordered `>`
    Ogt,
    /// ordered `<=`
    Ole,
    /// ordered `>=`
    Oge,
}

impl FloatPredicate {
    /// Textual mnemonic
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Oeq => "oeq",
            Self::One => "one",
            Self::Olt => "olt",
            Self::Ogt => "ogt",
            Self::Ole => "ole",
            Self::Oge => "oge",
        }
    }
}

/// Instruction payload
#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    /// Stack slot of the given type; yields a pointer
    Alloca {
        /// Type of the slot contents
        allocated: IrType,
    },
    /// Read through a pointer
    Load {
        /// Address
        ptr: Value,
    },
    /// Write through a pointer
    Store {
        /// Stored value
        value: Value,
        /// Address
        ptr: Value,
    },
    /// Arithmetic
    Binary {
        /// Operation
        op: BinaryOp,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Integer comparison
    ICmp {
        /// Predicate
        pred: IntPredicate,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Float comparison
    FCmp {
        /// Predicate
        pred: FloatPredicate,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Direct call
    Call {
        /// Called function
        callee: FunctionId,
        /// Arguments in order
        args: Vec<Value>,
    },
}

/// Single instruction and its result type
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Payload
    pub kind: InstKind,
    /// Result type; `Void` when nothing is produced
    pub ty: IrType,
    /// Debug name of the result
    pub name: Option<String>,
}

/// Block terminator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terminator {
    /// Leave the function, with a value unless the function returns void
    Return(Option<Value>),
    /// Control never gets here; closes code emitted after a `ret`
    Unreachable,
}

/// Straight-line instruction sequence
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Label used by the printer
    pub label: String,
    /// Instructions in execution order
    pub instructions: Vec<InstId>,
    /// How control leaves the block, once it has been terminated
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    /// Whether a terminator has been emitted
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}

/// Function declaration or definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Symbol name
    pub name: String,
    /// Function type
    pub signature: Signature,
    /// Visibility
    pub linkage: Linkage,
    /// Debug names of the declared parameters
    pub param_names: Vec<Option<String>>,
    instructions: Arena<Instruction>,
    blocks: Vec<BasicBlock>,
}

impl Function {
    fn new(name: String, signature: Signature, linkage: Linkage) -> Self {
        let param_names = vec![None; signature.params.len()];
        Self {
            name,
            signature,
            linkage,
            param_names,
            instructions: Arena::new(),
            blocks: Vec::new(),
        }
    }

    /// A function without blocks is only a declaration
    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append an empty block and return its index
    pub fn append_block(&mut self, label: impl Into<String>) -> BlockId {
        self.blocks.push(BasicBlock {
            label: label.into(),
            instructions: Vec::new(),
            terminator: None,
        });
        self.blocks.len() - 1
    }

    /// Blocks in layout order
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Block by index
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id)
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(id)
    }

    /// Instruction by id
    #[must_use]
    pub fn instruction(&self, id: InstId) -> &Instruction {
        &self.instructions[id]
    }

    /// All instructions in creation order
    pub fn instructions(&self) -> impl Iterator<Item = (InstId, &Instruction)> {
        self.instructions.iter()
    }

    pub(crate) fn push_instruction(&mut self, block: BlockId, instruction: Instruction) -> Option<InstId> {
        let target = self.blocks.get(block)?;
        debug_assert!(!target.is_terminated(), "instruction appended after terminator");
        let id = self.instructions.alloc(instruction);
        self.blocks[block].instructions.push(id);
        Some(id)
    }

    /// Number of `ret` terminators across all blocks
    #[must_use]
    pub fn return_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block.terminator, Some(Terminator::Return(_))))
            .count()
    }

    /// Type of a value used inside this function
    #[must_use]
    pub fn value_type(&self, value: &Value) -> IrType {
        match value {
            Value::Const(constant) => constant.ty(),
            Value::Param(index) => self
                .signature
                .params
                .get(*index as usize)
                .copied()
                .unwrap_or(IrType::Void),
            Value::Inst(id) => self.instructions[*id].ty,
            Value::Global(_) => IrType::Ptr,
        }
    }

    /// Display name of a parameter
    #[must_use]
    pub fn param_name(&self, index: u32) -> String {
        match self.param_names.get(index as usize) {
            Some(Some(name)) => name.clone(),
            _ => format!("arg{index}"),
        }
    }
}

/// Compilation unit
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    functions: Arena<Function>,
    by_name: IndexMap<String, FunctionId>,
    globals: Arena<GlobalString>,
}

impl Module {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Arena::new(),
            by_name: IndexMap::new(),
            globals: Arena::new(),
        }
    }

    /// Module identifier
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a function
    ///
    /// # Errors
    /// Returns [`BuilderError::DuplicateFunction`] if the name is taken
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        linkage: Linkage,
    ) -> Result<FunctionId, BuilderError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(BuilderError::DuplicateFunction(name));
        }
        let id = self.functions.alloc(Function::new(name.clone(), signature, linkage));
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Look up a function by symbol name
    #[must_use]
    pub fn get_function(&self, name: &str) -> Option<FunctionId> {
        self.by_name.get(name).copied()
    }

    /// Function by id
    #[must_use]
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id]
    }

    /// Mutable function by id
    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id]
    }

    /// Functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.by_name.values().map(|&id| (id, &self.functions[id]))
    }

    /// Intern a string constant as a new private global
    pub fn add_global_string(&mut self, value: impl Into<String>) -> GlobalId {
        let name = format!(".str.{}", self.globals.len());
        self.globals.alloc(GlobalString {
            name,
            value: value.into(),
        })
    }

    /// String global by id
    #[must_use]
    pub fn global(&self, id: GlobalId) -> &GlobalString {
        &self.globals[id]
    }

    /// String globals in creation order
    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &GlobalString)> {
        self.globals.iter()
    }
}
