mod scope;
mod value;

pub use scope::{Env, Environment};
pub use value::{Function, Value};

use crate::ast::{
    BinaryOperator, BlockStatement, ElseBranch, Expression, IfStatement, PostfixOperator,
    PrefixOperator, Program, Statement,
};
use crate::error::RuntimeError;
use crate::types;
use std::io::{self, Write};

/// Why evaluation stopped before producing an ordinary value.
///
/// `Return` travels up to the nearest function call; `Error` travels all the way
/// to the host. Both ride the `Err` side so `?` propagates them.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(err: RuntimeError) -> Self {
        Signal::Error(err)
    }
}

pub type EvalResult = std::result::Result<Value, Signal>;

/// Any node the evaluator can be pointed at.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Statement(&'a Statement),
    Expression(&'a Expression),
}

/// Tree-walking evaluator. `display` output is written to `W`.
pub struct Interpreter<W: Write = io::Stdout> {
    output: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        Self { output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Evaluates a single node. A missing node evaluates to `null`.
    pub fn evaluate(&mut self, node: Option<Node<'_>>, env: &Env) -> EvalResult {
        match node {
            None => Ok(Value::Null),
            Some(Node::Program(program)) => self.execute_statements(&program.statements, env),
            Some(Node::Statement(statement)) => self.execute_statement(statement, env),
            Some(Node::Expression(expr)) => self.evaluate_expression(expr, env),
        }
    }

    /// Runs a program directly in `env`, returning the value of its last statement.
    pub fn run(&mut self, program: &Program, env: &Env) -> Result<Value, RuntimeError> {
        let span = tracing::debug_span!("run", statements = program.statements.len());
        let _enter = span.enter();

        match self.execute_statements(&program.statements, env) {
            Ok(value) | Err(Signal::Return(value)) => Ok(value),
            Err(Signal::Error(err)) => {
                tracing::debug!(error = %err, "program failed");
                Err(err)
            }
        }
    }

    fn execute_statements(&mut self, statements: &[Statement], env: &Env) -> EvalResult {
        let mut result = Value::Null;
        for statement in statements {
            result = self.execute_statement(statement, env)?;
        }
        Ok(result)
    }

    fn execute_block(&mut self, block: &BlockStatement, env: &Env) -> EvalResult {
        let scope = Environment::enclosed(env);
        self.execute_statements(&block.statements, &scope)
    }

    fn execute_statement(&mut self, statement: &Statement, env: &Env) -> EvalResult {
        match statement {
            Statement::Var { name, value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr, env)?,
                    None => Value::Null,
                };
                env.borrow_mut().define(&name.name, value.clone(), false)?;
                Ok(value)
            }
            Statement::Const { name, value, .. } => {
                let value = self.evaluate_expression(value, env)?;
                env.borrow_mut().define(&name.name, value.clone(), true)?;
                Ok(value)
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr, env)?,
                    None => Value::Null,
                };
                Err(Signal::Return(value))
            }
            Statement::Block(block) => self.execute_block(block, env),
            Statement::If(stmt) => self.execute_if(stmt, env),
            Statement::While {
                condition, body, ..
            } => {
                while self.evaluate_expression(condition, env)?.is_truthy() {
                    self.execute_block(body, env)?;
                }
                Ok(Value::Null)
            }
            Statement::DoWhile {
                body, condition, ..
            } => {
                loop {
                    self.execute_block(body, env)?;
                    if !self.evaluate_expression(condition, env)?.is_truthy() {
                        break;
                    }
                }
                Ok(Value::Null)
            }
            Statement::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                let loop_env = Environment::enclosed(env);
                if let Some(init) = init {
                    self.execute_statement(init, &loop_env)?;
                }
                loop {
                    if let Some(condition) = condition {
                        if !self.evaluate_expression(condition, &loop_env)?.is_truthy() {
                            break;
                        }
                    }
                    self.execute_block(body, &loop_env)?;
                    if let Some(update) = update {
                        self.evaluate_expression(update, &loop_env)?;
                    }
                }
                Ok(Value::Null)
            }
            Statement::Expression { expression, .. } => self.evaluate_expression(expression, env),
            Statement::FunctionDeclaration { name, function, .. } => {
                let value = Value::Function(Function::new(function.clone(), env.clone()));
                env.borrow_mut().define(&name.name, value, false)?;
                Ok(Value::Null)
            }
            Statement::Display { arguments, .. } => {
                let mut rendered = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    rendered.push(self.evaluate_expression(argument, env)?.to_string());
                }
                writeln!(self.output, "{}", rendered.join(" "))
                    .map_err(|e| RuntimeError::Output(e.to_string()))?;
                Ok(Value::Null)
            }
        }
    }

    fn execute_if(&mut self, stmt: &IfStatement, env: &Env) -> EvalResult {
        if self.evaluate_expression(&stmt.condition, env)?.is_truthy() {
            return self.execute_block(&stmt.consequence, env);
        }
        match &stmt.alternative {
            Some(ElseBranch::Block(block)) => self.execute_block(block, env),
            Some(ElseBranch::If(nested)) => self.execute_if(nested, env),
            None => Ok(Value::Null),
        }
    }

    fn evaluate_expression(&mut self, expr: &Expression, env: &Env) -> EvalResult {
        match expr {
            Expression::Identifier(ident) => env
                .borrow()
                .get(&ident.name)
                .ok_or_else(|| RuntimeError::UndefinedIdentifier(ident.name.clone()).into()),
            Expression::IntegerLiteral { value, .. } => Ok(Value::Integer(*value)),
            Expression::FloatLiteral { value, .. } => Ok(Value::Float(*value)),
            Expression::StringLiteral { value, .. } => Ok(Value::String(value.clone())),
            Expression::BooleanLiteral { value, .. } => Ok(Value::Boolean(*value)),
            Expression::Prefix {
                operator, right, ..
            } => match operator {
                PrefixOperator::Not => {
                    let value = self.evaluate_expression(right, env)?;
                    Ok(Value::Boolean(!value.is_truthy()))
                }
                PrefixOperator::Negate => Ok(self.evaluate_expression(right, env)?.negate()?),
                PrefixOperator::Increment => self.update(right, "++", 1, true, env),
                PrefixOperator::Decrement => self.update(right, "--", -1, true, env),
            },
            Expression::Postfix { operator, left, .. } => match operator {
                PostfixOperator::Increment => self.update(left, "++", 1, false, env),
                PostfixOperator::Decrement => self.update(left, "--", -1, false, env),
            },
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => self.evaluate_infix(left, *operator, right, env),
            Expression::Ternary {
                condition,
                consequence,
                alternative,
                ..
            } => {
                if self.evaluate_expression(condition, env)?.is_truthy() {
                    self.evaluate_expression(consequence, env)
                } else {
                    self.evaluate_expression(alternative, env)
                }
            }
            Expression::Assignment { name, value, .. } => {
                let value = self.evaluate_expression(value, env)?;
                env.borrow_mut().assign(&name.name, value.clone())?;
                Ok(value)
            }
            Expression::Call {
                callee, arguments, ..
            } => {
                let callee = self.evaluate_expression(callee, env)?;
                let function = match callee {
                    Value::Function(function) => function,
                    other => return Err(RuntimeError::NotCallable(other.type_name().into()).into()),
                };
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate_expression(argument, env)?);
                }
                Ok(self.call_function(&function, args)?)
            }
            Expression::Function(literal) => {
                Ok(Value::Function(Function::new(literal.clone(), env.clone())))
            }
        }
    }

    fn evaluate_infix(
        &mut self,
        left: &Expression,
        operator: BinaryOperator,
        right: &Expression,
        env: &Env,
    ) -> EvalResult {
        let left = self.evaluate_expression(left, env)?;
        match operator {
            BinaryOperator::And if !left.is_truthy() => Ok(Value::Boolean(false)),
            BinaryOperator::Or if left.is_truthy() => Ok(Value::Boolean(true)),
            _ => {
                let right = self.evaluate_expression(right, env)?;
                Ok(left.binary_op(operator, &right)?)
            }
        }
    }

    /// `++`/`--` in either position: writes `value + delta` back to the identifier.
    fn update(
        &mut self,
        target: &Expression,
        operator: &str,
        delta: i64,
        prefix: bool,
        env: &Env,
    ) -> EvalResult {
        let Expression::Identifier(ident) = target else {
            return Err(RuntimeError::InvalidUpdateTarget(operator.to_string()).into());
        };

        let current = env
            .borrow()
            .get(&ident.name)
            .ok_or_else(|| RuntimeError::UndefinedAssignment(ident.name.clone()))?;
        let updated = match &current {
            Value::Integer(i) => Value::Integer(
                i.checked_add(delta)
                    .ok_or_else(|| RuntimeError::IntegerOverflow(operator.to_string()))?,
            ),
            Value::Float(f) => Value::Float(f + delta as f64),
            other => {
                return Err(RuntimeError::NonNumericUpdate {
                    operator: operator.to_string(),
                    actual: other.type_name().to_string(),
                }
                .into());
            }
        };

        env.borrow_mut().assign(&ident.name, updated.clone())?;
        Ok(if prefix { updated } else { current })
    }

    /// Applies a function value to already-evaluated arguments.
    pub fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let span = tracing::debug_span!("call", function = %function.name(), args = args.len());
        let _enter = span.enter();

        let params = function.params();
        if params.len() != args.len() {
            return Err(RuntimeError::ArgumentCount {
                function: function.name().to_string(),
                expected: params.len(),
                actual: args.len(),
            });
        }

        let call_env = Environment::enclosed(&function.env);
        for (param, arg) in params.iter().zip(args) {
            let declared = &param.type_annotation.name;
            let actual = arg.type_name();
            let value = types::coerce_argument(declared, arg).ok_or_else(|| {
                RuntimeError::ArgumentType {
                    param: param.name.name.clone(),
                    function: function.name().to_string(),
                    expected: declared.clone(),
                    actual: actual.to_string(),
                }
            })?;
            call_env.borrow_mut().define(&param.name.name, value, false)?;
        }

        match self.execute_block(&function.literal.body, &call_env) {
            Ok(value) | Err(Signal::Return(value)) => Ok(value),
            Err(Signal::Error(err)) => Err(err),
        }
    }
}
