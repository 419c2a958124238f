use super::cursor::Cursor;
use crate::error;
use crate::lang::token::tok;
use crate::lang::{Error, Type};
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## DEF FN functions
///
/// A definition keeps a handle on the line it came from and the offset
/// of its expression, so calling one evaluates the original tokens.
#[derive(Debug, Clone)]
pub struct UserFn {
    params: Vec<Vec<u8>>,
    body: Rc<[u8]>,
    pos: usize,
    text: Vec<u8>,
}

impl UserFn {
    /// Parse `name[(p, ...)] = expr` after `DEF FN`. The cursor is left
    /// at the end of the statement.
    pub fn parse(c: &mut Cursor) -> Result<(Vec<u8>, UserFn)> {
        let name = c.expect_identifier()?;
        let mut params = vec![];
        if c.eat(b'(') {
            loop {
                params.push(c.expect_identifier()?);
                if !c.eat(b',') {
                    break;
                }
            }
            c.expect(b')')?;
        }
        c.expect(tok::EQUAL)?;
        c.skip_spaces();
        let pos = c.pos();
        let text = c.rest_of_statement();
        if text.is_empty() {
            return Err(error!(MissingOperand));
        }
        Ok((
            name,
            UserFn {
                params,
                body: c.bytes().clone(),
                pos,
                text,
            },
        ))
    }

    pub fn params(&self) -> &[Vec<u8>] {
        &self.params
    }

    /// A cursor on the function's expression.
    pub fn body(&self) -> Cursor {
        Cursor::new(self.body.clone(), self.pos)
    }

    fn same_as(&self, other: &UserFn) -> bool {
        self.params == other.params && self.text == other.text
    }
}

/// Every defined function by variable key, plus the call depth.
#[derive(Debug, Default)]
pub struct UserFns {
    fns: HashMap<String, (UserFn, Type)>,
    depth: usize,
}

impl UserFns {
    pub fn clear(&mut self) {
        self.fns.clear();
        self.depth = 0;
    }

    /// Running the same DEF again is harmless; a different body for a
    /// name already in use is Duplicate Definition.
    pub fn define(&mut self, key: String, ty: Type, f: UserFn) -> Result<()> {
        if let Some((existing, _)) = self.fns.get(&key) {
            if existing.same_as(&f) {
                return Ok(());
            }
            return Err(error!(DuplicateDefinition));
        }
        self.fns.insert(key, (f, ty));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<(UserFn, Type)> {
        self.fns
            .get(key)
            .cloned()
            .ok_or_else(|| error!(UndefinedUserFunction))
    }

    pub fn enter(&mut self, limit: usize) -> Result<()> {
        if self.depth >= limit {
            return Err(error!(OutOfMemory; "FUNCTION CALLS NESTED TOO DEEPLY"));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::crunch;

    fn parse(s: &str) -> Result<(Vec<u8>, UserFn)> {
        let mut c = Cursor::new(crunch(s).unwrap().into(), 0);
        c.take();
        c.take();
        UserFn::parse(&mut c)
    }

    #[test]
    fn test_parse() {
        let (name, f) = parse("DEF FNA(X,Y)=X*Y+1:PRINT").unwrap();
        assert_eq!(name, b"A".to_vec());
        assert_eq!(f.params(), &[b"X".to_vec(), b"Y".to_vec()]);
        let mut body = f.body();
        assert_eq!(body.identifier(), Some(b"X".to_vec()));
        assert_eq!(parse("DEF FNB=").unwrap_err().code(), 22);
    }

    #[test]
    fn test_redefinition() {
        let mut fns = UserFns::default();
        let (_, f) = parse("DEF FNA(X)=X+1").unwrap();
        fns.define("A!".into(), Type::Single, f.clone()).unwrap();
        fns.define("A!".into(), Type::Single, f).unwrap();
        let (_, g) = parse("DEF FNA(X)=X+2").unwrap();
        assert_eq!(
            fns.define("A!".into(), Type::Single, g).unwrap_err().code(),
            10
        );
        assert_eq!(fns.get("Z!").unwrap_err().code(), 18);
    }

    #[test]
    fn test_depth() {
        let mut fns = UserFns::default();
        fns.enter(2).unwrap();
        fns.enter(2).unwrap();
        assert_eq!(fns.enter(2).unwrap_err().code(), 7);
        fns.leave();
        assert!(fns.enter(2).is_ok());
    }
}
