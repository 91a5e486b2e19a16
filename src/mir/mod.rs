//! The typed mid-level IR. Matches `original_source/mir/mir.go`, reimplemented
//! as tagged variants (Design Notes §9) with `FunctionDeclaration` held in an
//! instance-owned arena (see SPEC_FULL.md §3.1) so self-recursive `Call`s and
//! argument back-references are index copies, never reference cycles.

pub mod slot;
pub mod types;

use crate::arena::{Arena, P};
use crate::span::Span;

pub use types::{StructField, Type, TypeView};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    Gt,
    Ne,
    Le,
    Ge,
    And,
    Or,
    Pow,
}

pub struct GlobalDeclaration<'a> {
    pub name: String,
    pub type_view: TypeView,
    pub span: Span<'a>,
}

pub struct Argument<'a> {
    pub name: String,
    pub type_view: TypeView,
    pub span: Span<'a>,
}

pub struct FunctionDeclaration<'a> {
    pub name: String,
    pub arguments: Vec<Argument<'a>>,
    pub return_type_view: TypeView,
    pub body: Block<'a>,
    pub proc_code: String,
    pub argument_ids: String,
    pub warp: bool,
    /// Sum of the function's local declarations' slot counts. The source of
    /// truth for the call-stack frame size (Design Notes §9's open question):
    /// `Declare` statements contribute no blocks, so this is never re-derived
    /// from the body.
    pub stack_size: u32,
    pub span: Span<'a>,
}

pub enum Declaration<'a> {
    Global(GlobalDeclaration<'a>),
    Function(P<FunctionDeclaration<'a>>),
}

pub struct Block<'a> {
    pub statements: Vec<Statement<'a>>,
    pub span: Span<'a>,
}

pub enum Statement<'a> {
    Declare {
        name: String,
        type_view: TypeView,
        span: Span<'a>,
    },
    Assign {
        accessor: Accessor<'a>,
        value: Expression<'a>,
        span: Span<'a>,
    },
    Return {
        value: Expression<'a>,
        span: Span<'a>,
    },
}

/// Structure-member access is specifiable (a `TypeView` already carries
/// field offsets) but no constructor for it exists yet — only `Variable`.
pub enum Accessor<'a> {
    Variable { type_view: TypeView, span: Span<'a> },
}

impl<'a> Accessor<'a> {
    pub fn type_view(&self) -> &TypeView {
        match self {
            Accessor::Variable { type_view, .. } => type_view,
        }
    }
}

pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
}

pub enum Expression<'a> {
    Literal(Literal),
    Accessor(Box<Accessor<'a>>),
    Call {
        function: P<FunctionDeclaration<'a>>,
        arguments: Vec<Expression<'a>>,
    },
    Binary {
        lhs: Box<Expression<'a>>,
        rhs: Box<Expression<'a>>,
        operator: Operator,
        output_type: Type,
    },
    Unary {
        value: Box<Expression<'a>>,
        operator: Operator,
        output_type: Type,
    },
}

pub struct Program<'a> {
    pub functions: Arena<FunctionDeclaration<'a>>,
    pub declarations: Vec<Declaration<'a>>,
}

impl<'a> Program<'a> {
    pub fn new() -> Self {
        Program {
            functions: Arena::empty(),
            declarations: Vec::new(),
        }
    }

    pub fn declare_function(&mut self, function: FunctionDeclaration<'a>) -> P<FunctionDeclaration<'a>> {
        let ptr = self.functions.alloc(function);
        self.declarations.push(Declaration::Function(ptr));
        ptr
    }

    pub fn function(&self, ptr: P<FunctionDeclaration<'a>>) -> &FunctionDeclaration<'a> {
        self.functions.get(&ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SourceFile;

    fn span(file: &SourceFile) -> Span<'_> {
        Span {
            from: crate::span::Position {
                index: 0,
                line_index: 0,
                lineno: 0,
            },
            to: crate::span::Position {
                index: 0,
                line_index: 0,
                lineno: 0,
            },
            file,
        }
    }

    #[test]
    fn self_recursive_call_is_an_index_not_a_cycle() {
        let file = SourceFile::new("test.yum", "");
        let mut program = Program::new();
        let placeholder = FunctionDeclaration {
            name: "Hello".to_string(),
            arguments: Vec::new(),
            return_type_view: TypeView {
                typ: Type::String,
                slots: Vec::new(),
                offset: 0,
            },
            body: Block {
                statements: Vec::new(),
                span: span(&file),
            },
            proc_code: "Hello".to_string(),
            argument_ids: "[]".to_string(),
            warp: false,
            stack_size: 0,
            span: span(&file),
        };
        let ptr = program.declare_function(placeholder);

        let self_call = Expression::Call {
            function: ptr,
            arguments: Vec::new(),
        };
        match self_call {
            Expression::Call { function, .. } => {
                assert_eq!(program.function(function).name, "Hello");
            }
            _ => unreachable!(),
        }
    }
}
