use std::fmt::{self, Display};
use std::rc::Rc;

use crate::lexer::Token;

/// A parsed program: the ordered top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn token_literal(&self) -> &str {
        self.statements
            .first()
            .map(Statement::token_literal)
            .unwrap_or("")
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

/// A type name tied to the token that introduced it.
///
/// Names are `int`, `float`, `string`, `boolean`, `void`, a user-written identifier,
/// or a synthesized signature such as `fn(int, int) => int`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub token: Token,
    pub name: String,
}

impl TypeAnnotation {
    pub fn new(token: Token, name: impl Into<String>) -> Self {
        Self {
            token,
            name: name.into(),
        }
    }
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub name: String,
}

impl Identifier {
    pub fn new(token: Token) -> Self {
        let name = token.literal.clone();
        Self { token, name }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A function parameter with its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Identifier,
    pub type_annotation: TypeAnnotation,
}

impl Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_annotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Not,
    Negate,
    Increment,
    Decrement,
}

impl Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            PrefixOperator::Not => "!",
            PrefixOperator::Negate => "-",
            PrefixOperator::Increment => "++",
            PrefixOperator::Decrement => "--",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOperator {
    Increment,
    Decrement,
}

impl Display for PostfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            PostfixOperator::Increment => "++",
            PostfixOperator::Decrement => "--",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    EqualEqual,
    NotEqual,
    And,
    Or,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEq => "<=",
            BinaryOperator::GreaterEq => ">=",
            BinaryOperator::EqualEqual => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    IntegerLiteral {
        token: Token,
        value: i64,
    },
    FloatLiteral {
        token: Token,
        value: f64,
    },
    StringLiteral {
        token: Token,
        value: String,
    },
    BooleanLiteral {
        token: Token,
        value: bool,
    },
    Prefix {
        token: Token,
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    Postfix {
        token: Token,
        operator: PostfixOperator,
        left: Box<Expression>,
    },
    Infix {
        token: Token,
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Ternary {
        token: Token,
        condition: Box<Expression>,
        consequence: Box<Expression>,
        alternative: Box<Expression>,
    },
    Assignment {
        token: Token,
        name: Identifier,
        value: Box<Expression>,
    },
    Call {
        token: Token,
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    // Shared with the function values created from it
    Function(Rc<FunctionLiteral>),
}

impl Expression {
    pub fn token(&self) -> &Token {
        match self {
            Expression::Identifier(ident) => &ident.token,
            Expression::IntegerLiteral { token, .. }
            | Expression::FloatLiteral { token, .. }
            | Expression::StringLiteral { token, .. }
            | Expression::BooleanLiteral { token, .. }
            | Expression::Prefix { token, .. }
            | Expression::Postfix { token, .. }
            | Expression::Infix { token, .. }
            | Expression::Ternary { token, .. }
            | Expression::Assignment { token, .. }
            | Expression::Call { token, .. } => token,
            Expression::Function(literal) => &literal.token,
        }
    }

    pub fn token_literal(&self) -> &str {
        &self.token().literal
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::IntegerLiteral { value, .. } => write!(f, "{}", value),
            Expression::FloatLiteral { token, .. } => write!(f, "{}", token.literal),
            // No escapes exist, so pick the quote the value does not contain
            Expression::StringLiteral { value, .. } if value.contains('"') => {
                write!(f, "'{}'", value)
            }
            Expression::StringLiteral { value, .. } => write!(f, "\"{}\"", value),
            Expression::BooleanLiteral { value, .. } => write!(f, "{}", value),
            Expression::Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Expression::Postfix { operator, left, .. } => write!(f, "({}{})", left, operator),
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Ternary {
                condition,
                consequence,
                alternative,
                ..
            } => write!(f, "({} ? {} : {})", condition, consequence, alternative),
            Expression::Assignment { name, value, .. } => write!(f, "({} = {})", name, value),
            Expression::Call {
                callee, arguments, ..
            } => {
                write!(f, "{}(", callee)?;
                write_joined(f, arguments)?;
                write!(f, ")")
            }
            Expression::Function(literal) => write!(f, "{}", literal),
        }
    }
}

/// `fn [name](params)[: return] { body }`, as a literal or the payload of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub token: Token,
    pub name: Option<Identifier>,
    pub params: Vec<Param>,
    pub return_type: TypeAnnotation,
    pub body: BlockStatement,
}

impl FunctionLiteral {
    /// The signature string used for type inference, e.g. `fn(int, float) => string`.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.type_annotation.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("fn({}) => {}", params, self.return_type)
    }
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn")?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        write!(f, "(")?;
        write_joined(f, &self.params)?;
        write!(f, "): {} {}", self.return_type, self.body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        write!(f, " }}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub token: Token,
    pub condition: Expression,
    pub consequence: BlockStatement,
    pub alternative: Option<ElseBranch>,
}

impl Display for IfStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if ({}) {}", self.condition, self.consequence)?;
        match &self.alternative {
            Some(ElseBranch::Block(block)) => write!(f, " else {}", block),
            Some(ElseBranch::If(nested)) => write!(f, " else {}", nested),
            None => Ok(()),
        }
    }
}

/// What follows `else`: a plain block or another `if`.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Block(BlockStatement),
    If(Box<IfStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Var {
        token: Token,
        name: Identifier,
        type_annotation: Option<TypeAnnotation>,
        value: Option<Expression>,
    },
    Const {
        token: Token,
        name: Identifier,
        type_annotation: Option<TypeAnnotation>,
        value: Expression,
    },
    Return {
        token: Token,
        value: Option<Expression>,
    },
    Block(BlockStatement),
    If(IfStatement),
    For {
        token: Token,
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: BlockStatement,
    },
    While {
        token: Token,
        condition: Expression,
        body: BlockStatement,
    },
    DoWhile {
        token: Token,
        body: BlockStatement,
        condition: Expression,
    },
    Expression {
        token: Token,
        expression: Expression,
    },
    FunctionDeclaration {
        token: Token,
        name: Identifier,
        function: Rc<FunctionLiteral>,
    },
    Display {
        token: Token,
        arguments: Vec<Expression>,
    },
}

impl Statement {
    pub fn token(&self) -> &Token {
        match self {
            Statement::Block(block) => &block.token,
            Statement::If(stmt) => &stmt.token,
            Statement::Var { token, .. }
            | Statement::Const { token, .. }
            | Statement::Return { token, .. }
            | Statement::For { token, .. }
            | Statement::While { token, .. }
            | Statement::DoWhile { token, .. }
            | Statement::Expression { token, .. }
            | Statement::FunctionDeclaration { token, .. }
            | Statement::Display { token, .. } => token,
        }
    }

    pub fn token_literal(&self) -> &str {
        &self.token().literal
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Var {
                name,
                type_annotation,
                value,
                ..
            } => write_declaration(f, "var", name, type_annotation.as_ref(), value.as_ref()),
            Statement::Const {
                name,
                type_annotation,
                value,
                ..
            } => write_declaration(f, "const", name, type_annotation.as_ref(), Some(value)),
            Statement::Return { value, .. } => match value {
                Some(value) => write!(f, "return {};", value),
                None => write!(f, "return;"),
            },
            Statement::Block(block) => write!(f, "{}", block),
            Statement::If(stmt) => write!(f, "{}", stmt),
            Statement::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                write!(f, "for (")?;
                match init {
                    Some(init) => write!(f, "{}", init)?,
                    None => write!(f, ";")?,
                }
                if let Some(condition) = condition {
                    write!(f, " {}", condition)?;
                }
                write!(f, ";")?;
                if let Some(update) = update {
                    write!(f, " {}", update)?;
                }
                write!(f, ") {}", body)
            }
            Statement::While {
                condition, body, ..
            } => write!(f, "while ({}) {}", condition, body),
            Statement::DoWhile {
                body, condition, ..
            } => write!(f, "do {} while ({});", body, condition),
            Statement::Expression { expression, .. } => write!(f, "{};", expression),
            Statement::FunctionDeclaration { function, .. } => write!(f, "{}", function),
            Statement::Display { arguments, .. } => {
                write!(f, "display(")?;
                write_joined(f, arguments)?;
                write!(f, ");")
            }
        }
    }
}

fn write_declaration(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    name: &Identifier,
    type_annotation: Option<&TypeAnnotation>,
    value: Option<&Expression>,
) -> fmt::Result {
    write!(f, "{} {}", keyword, name)?;
    if let Some(ty) = type_annotation {
        write!(f, ": {}", ty)?;
    }
    if let Some(value) = value {
        write!(f, " = {}", value)?;
    }
    write!(f, ";")
}

fn write_joined<T: Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
