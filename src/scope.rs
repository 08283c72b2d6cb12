use crate::path::{Path, Segment};
use crate::token::{Operator, Token};

/// Tracks the current schema scope as a stack of [`Path`]s (spec §4.2).
///
/// Every `Token::find` match is pushed before it is evaluated and popped
/// immediately after, regardless of operator — including `@@`, `@@!` and
/// `%%`, which don't change scope but still keep the stack depth in lockstep
/// with the compile loop's recursion.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Path>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Path::root()],
        }
    }

    /// Pushes the scope a directive token resolves to.
    pub fn push_token(&mut self, token: &Token) {
        let top = self.top();
        let mut scope = match token.operator {
            Operator::Relative => top.clone(),
            Operator::Absolute => Path::root(),
            Operator::Parent => {
                let mut parent = top.clone();
                parent.pop();
                parent
            }
            // `@@`, `@@!`, `%%` don't address the schema through `path`, but
            // still push/pop symmetrically to keep stack depth consistent.
            Operator::Include | Operator::IncludeChomp | Operator::Function => {
                self.scopes.push(top.clone());
                return;
            }
        };

        for seg in &token.path {
            if seg == "^^" {
                scope.pop();
            } else {
                scope.push(seg.clone());
            }
        }

        self.scopes.push(scope);
    }

    /// Pushes a sequence index onto the current scope, for iterating over a
    /// list value (spec §4.5).
    pub fn push_index(&mut self, index: usize) {
        let mut scope = self.top().clone();
        scope.push(Segment::Index(index));
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn top(&self) -> &Path {
        self.scopes
            .last()
            .expect("ScopeStack never empties below its root scope")
    }
}
