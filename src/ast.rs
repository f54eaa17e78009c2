use std::rc::Rc;

use crate::token::{LiteralValue, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Box<ExpressionStmt>),
    Print(Box<PrintStmt>),
    Var(Box<VarStmt>),
    Block(Box<BlockStmt>),
    If(Box<IfStmt>),
    While(Box<WhileStmt>),
    Function(Rc<FunctionStmt>),
    Return(Box<ReturnStmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintStmt {
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarStmt {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_statement: Stmt,
    pub else_statement: Option<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Stmt,
}

/// Shared between the tree and every function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStmt {
    pub name: Token,
    pub parameters: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub keyword: Token,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Box<LiteralExpr>),
    Grouping(Box<GroupingExpr>),
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Logical(Box<LogicalExpr>),
    Variable(Box<VariableExpr>),
    Assign(Box<AssignExpr>),
    Call(Box<CallExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingExpr {
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: Token,
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Expr,
    pub operator: Token,
    pub right: Expr,
}

/// Short-circuiting `and` / `or`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
    pub left: Expr,
    pub operator: Token,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub name: Token,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Expr,
    /// Closing paren, used to locate runtime errors of the call.
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

impl Expr {
    pub fn literal(value: LiteralValue) -> Expr {
        Expr::Literal(Box::new(LiteralExpr { value }))
    }

    pub fn grouping(expression: Expr) -> Expr {
        Expr::Grouping(Box::new(GroupingExpr { expression }))
    }

    pub fn unary(operator: Token, expression: Expr) -> Expr {
        Expr::Unary(Box::new(UnaryExpr {
            operator,
            expression,
        }))
    }

    pub fn binary(left: Expr, operator: Token, right: Expr) -> Expr {
        Expr::Binary(Box::new(BinaryExpr {
            left,
            operator,
            right,
        }))
    }

    pub fn logical(left: Expr, operator: Token, right: Expr) -> Expr {
        Expr::Logical(Box::new(LogicalExpr {
            left,
            operator,
            right,
        }))
    }
}

impl Stmt {
    pub fn expression(expression: Expr) -> Stmt {
        Stmt::Expression(Box::new(ExpressionStmt { expression }))
    }

    pub fn block(statements: Vec<Stmt>) -> Stmt {
        Stmt::Block(Box::new(BlockStmt { statements }))
    }

    pub fn while_loop(condition: Expr, body: Stmt) -> Stmt {
        Stmt::While(Box::new(WhileStmt { condition, body }))
    }
}
