use super::cursor::Cursor;
use super::{Function, Operation, Val};
use crate::error;
use crate::lang::token::{tok, xstmt, Code, PREFIX_FN, PREFIX_XFN, PREFIX_XSTMT};
use crate::lang::Error;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## Evaluation context
///
/// What an expression may ask of the machine around it. The evaluator
/// itself never touches variables, files or the screen.
pub trait Context {
    fn variable(&mut self, name: &[u8]) -> Result<Val>;
    fn element(&mut self, name: &[u8], subscripts: &[i16]) -> Result<Val>;
    /// A user function defined with DEF FN.
    fn call(&mut self, name: &[u8], args: Vec<Val>) -> Result<Val>;
    /// Built-ins that read machine state: RND, EOF, POS, TIMER, ERR...
    fn system(&mut self, code: Code, args: Vec<Val>) -> Result<Val>;
    fn varptr(&mut self, name: &[u8]) -> Result<Val>;
}

const UNARY: u8 = 12;

fn binding_power(op: u8) -> Option<u8> {
    Some(match op {
        tok::IMP => 1,
        tok::EQV => 2,
        tok::XOR => 3,
        tok::OR => 4,
        tok::AND => 5,
        tok::EQUAL
        | tok::NOT_EQUAL
        | tok::LESS
        | tok::LESS_EQUAL
        | tok::GREATER
        | tok::GREATER_EQUAL => 6,
        tok::PLUS | tok::MINUS => 7,
        tok::MOD => 8,
        tok::IDIV => 9,
        tok::MULTIPLY | tok::DIVIDE => 10,
        tok::POWER => 11,
        _ => return None,
    })
}

/// The operator at the cursor and its length in bytes. Relationals
/// typed with a space between them arrive as two tokens.
fn operator(c: &mut Cursor) -> Option<(u8, usize)> {
    let op = c.peek();
    binding_power(op)?;
    let mut probe = c.clone();
    probe.advance(1);
    let second = probe.peek();
    let joined = match (op, second) {
        (tok::GREATER, tok::EQUAL) | (tok::EQUAL, tok::GREATER) => Some(tok::GREATER_EQUAL),
        (tok::LESS, tok::EQUAL) | (tok::EQUAL, tok::LESS) => Some(tok::LESS_EQUAL),
        (tok::LESS, tok::GREATER) | (tok::GREATER, tok::LESS) => Some(tok::NOT_EQUAL),
        _ => None,
    };
    match joined {
        Some(op) => Some((op, probe.pos() + 1 - c.pos())),
        None => Some((op, 1)),
    }
}

fn apply(op: u8, lhs: Val, rhs: Val) -> Result<Val> {
    match op {
        tok::PLUS => Operation::sum(lhs, rhs),
        tok::MINUS => Operation::subtract(lhs, rhs),
        tok::MULTIPLY => Operation::multiply(lhs, rhs),
        tok::DIVIDE => Operation::divide(lhs, rhs),
        tok::IDIV => Operation::divide_int(lhs, rhs),
        tok::MOD => Operation::modulus(lhs, rhs),
        tok::POWER => Operation::power(lhs, rhs),
        tok::EQUAL => Operation::equal(lhs, rhs),
        tok::NOT_EQUAL => Operation::not_equal(lhs, rhs),
        tok::LESS => Operation::less(lhs, rhs),
        tok::LESS_EQUAL => Operation::less_equal(lhs, rhs),
        tok::GREATER => Operation::greater(lhs, rhs),
        tok::GREATER_EQUAL => Operation::greater_equal(lhs, rhs),
        tok::AND => Operation::and(lhs, rhs),
        tok::OR => Operation::or(lhs, rhs),
        tok::XOR => Operation::xor(lhs, rhs),
        tok::EQV => Operation::eqv(lhs, rhs),
        tok::IMP => Operation::imp(lhs, rhs),
        _ => Err(error!(SyntaxError)),
    }
}

/// Evaluate one expression, leaving the cursor on the first byte that
/// cannot continue it.
pub fn expression(c: &mut Cursor, ctx: &mut dyn Context) -> Result<Val> {
    binary(c, ctx, 0)
}

fn binary(c: &mut Cursor, ctx: &mut dyn Context, min_bp: u8) -> Result<Val> {
    let mut lhs = unary(c, ctx)?;
    while let Some((op, len)) = operator(c) {
        let bp = binding_power(op).unwrap_or(0);
        if bp <= min_bp {
            break;
        }
        c.advance(len);
        let rhs = binary(c, ctx, bp)?;
        lhs = apply(op, lhs, rhs)?;
    }
    Ok(lhs)
}

fn unary(c: &mut Cursor, ctx: &mut dyn Context) -> Result<Val> {
    match c.peek() {
        tok::MINUS => {
            c.advance(1);
            Operation::negate(binary(c, ctx, UNARY)?)
        }
        tok::PLUS => {
            c.advance(1);
            binary(c, ctx, UNARY)
        }
        tok::NOT => {
            c.advance(1);
            Operation::not(binary(c, ctx, UNARY)?)
        }
        _ => operand(c, ctx),
    }
}

fn operand(c: &mut Cursor, ctx: &mut dyn Context) -> Result<Val> {
    if let Some(val) = c.number() {
        return Ok(val);
    }
    if let Some(s) = c.string() {
        return Ok(Val::String(s));
    }
    let b = c.peek();
    match b {
        b'(' => {
            c.advance(1);
            let val = expression(c, ctx)?;
            c.expect(b')')?;
            Ok(val)
        }
        PREFIX_FN | PREFIX_XFN => {
            let code = Code::Prefixed(b, c.peek_second());
            c.advance(2);
            let args = if c.peek() == b'(' {
                arguments(c, ctx)?
            } else {
                vec![]
            };
            match Function::call(code, &args) {
                Some(result) => result,
                None => ctx.system(code, args),
            }
        }
        PREFIX_XSTMT => {
            let index = c.peek_second();
            match index {
                xstmt::DATE | xstmt::TIME | xstmt::TIMER => {
                    c.advance(2);
                    ctx.system(Code::Prefixed(b, index), vec![])
                }
                _ => Err(error!(SyntaxError)),
            }
        }
        tok::ERR | tok::ERL | tok::CSRLIN | tok::INKEY => {
            c.advance(1);
            ctx.system(Code::Byte(b), vec![])
        }
        tok::STRING | tok::INSTR => {
            c.advance(1);
            let args = arguments(c, ctx)?;
            Function::call(Code::Byte(b), &args).unwrap_or_else(|| Err(error!(SyntaxError)))
        }
        tok::POINT => {
            c.advance(1);
            let args = arguments(c, ctx)?;
            ctx.system(Code::Byte(b), args)
        }
        tok::VARPTR => {
            c.advance(1);
            c.expect(b'(')?;
            let name = c.expect_identifier()?;
            c.skip_parens()?;
            c.expect(b')')?;
            ctx.varptr(&name)
        }
        tok::FN => {
            c.advance(1);
            let name = c.expect_identifier()?;
            let args = if c.peek() == b'(' {
                arguments(c, ctx)?
            } else {
                vec![]
            };
            ctx.call(&name, args)
        }
        tok::USR => Err(error!(AdvancedFeature)),
        _ => match c.identifier() {
            Some(name) => {
                if c.peek() == b'(' {
                    let subscripts = subscripts(c, ctx)?;
                    ctx.element(&name, &subscripts)
                } else {
                    ctx.variable(&name)
                }
            }
            None => {
                if c.at_end() || b == b')' || b == b',' {
                    Err(error!(MissingOperand))
                } else {
                    Err(error!(SyntaxError))
                }
            }
        },
    }
}

/// A parenthesised argument list. A `#` before an argument is allowed
/// so file functions read naturally.
pub fn arguments(c: &mut Cursor, ctx: &mut dyn Context) -> Result<Vec<Val>> {
    c.expect(b'(')?;
    let mut args = vec![];
    loop {
        c.eat(b'#');
        args.push(expression(c, ctx)?);
        if !c.eat(b',') {
            break;
        }
    }
    c.expect(b')')?;
    Ok(args)
}

pub fn subscripts(c: &mut Cursor, ctx: &mut dyn Context) -> Result<Vec<i16>> {
    arguments(c, ctx)?
        .into_iter()
        .map(i16::try_from)
        .collect()
}

pub fn float(c: &mut Cursor, ctx: &mut dyn Context) -> Result<f64> {
    f64::try_from(expression(c, ctx)?)
}

pub fn integer(c: &mut Cursor, ctx: &mut dyn Context) -> Result<i16> {
    i16::try_from(expression(c, ctx)?)
}

pub fn string(c: &mut Cursor, ctx: &mut dyn Context) -> Result<Vec<u8>> {
    Vec::<u8>::try_from(expression(c, ctx)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::crunch;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Vars {
        vars: HashMap<Vec<u8>, Val>,
    }

    impl Context for Vars {
        fn variable(&mut self, name: &[u8]) -> Result<Val> {
            Ok(self.vars.get(name).cloned().unwrap_or(Val::Single(0.0)))
        }
        fn element(&mut self, _name: &[u8], subscripts: &[i16]) -> Result<Val> {
            Ok(Val::Integer(subscripts.iter().sum()))
        }
        fn call(&mut self, _name: &[u8], args: Vec<Val>) -> Result<Val> {
            Ok(Val::Integer(args.len() as i16))
        }
        fn system(&mut self, _code: Code, _args: Vec<Val>) -> Result<Val> {
            Ok(Val::Integer(99))
        }
        fn varptr(&mut self, _name: &[u8]) -> Result<Val> {
            Ok(Val::Integer(4096))
        }
    }

    fn eval(s: &str) -> Result<Val> {
        let mut ctx = Vars::default();
        ctx.vars.insert(b"A".to_vec(), Val::Single(2.0));
        ctx.vars.insert(b"B$".to_vec(), Val::from("HI"));
        let mut c = Cursor::new(crunch(s)?.into(), 0);
        expression(&mut c, &mut ctx)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2+3*4"), Ok(Val::Integer(14)));
        assert_eq!(eval("(2+3)*4"), Ok(Val::Integer(20)));
        assert_eq!(eval("10-4-3"), Ok(Val::Integer(3)));
        assert_eq!(eval("2^3^2"), Ok(Val::Single(64.0)));
        assert_eq!(eval("7\\2*2"), Ok(Val::Integer(1)));
        assert_eq!(eval("7 MOD 4+1"), Ok(Val::Integer(4)));
        assert_eq!(eval("1+1=2 AND 3>2"), Ok(Val::Integer(-1)));
    }

    #[test]
    fn test_unary_binds_tightest() {
        assert_eq!(eval("-2^2"), Ok(Val::Single(4.0)));
        assert_eq!(eval("- -3"), Ok(Val::Integer(3)));
        assert_eq!(eval("NOT 0"), Ok(Val::Integer(-1)));
    }

    #[test]
    fn test_split_relational() {
        assert_eq!(eval("3> =3"), Ok(Val::Integer(-1)));
        assert_eq!(eval("A< >2"), Ok(Val::Integer(0)));
    }

    #[test]
    fn test_operands() {
        assert_eq!(eval("A*A"), Ok(Val::Single(4.0)));
        assert_eq!(eval("B$+\"!\""), Ok(Val::from("HI!")));
        assert_eq!(eval("X(1,2)"), Ok(Val::Integer(3)));
        assert_eq!(eval("FNF(1,2,3)"), Ok(Val::Integer(3)));
        assert_eq!(eval("LEN(B$)"), Ok(Val::Integer(2)));
        assert_eq!(eval("RND(1)"), Ok(Val::Integer(99)));
        assert_eq!(eval("INSTR(B$,\"I\")"), Ok(Val::Integer(2)));
        assert_eq!(eval("VARPTR(A)"), Ok(Val::Integer(4096)));
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("1+").unwrap_err().code(), 22);
        assert_eq!(eval("(1").unwrap_err().code(), 2);
        assert_eq!(eval("B$*2").unwrap_err().code(), 13);
        assert_eq!(eval("1/0").unwrap_err().code(), 11);
        assert_eq!(eval("USR(0)").unwrap_err().code(), 73);
    }
}
