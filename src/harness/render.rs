//! A recording renderer for tests.
//!
//! Trees are plain strings; the target keeps every mounted frame so tests
//! can assert on render counts and ordering, not just the latest output.

use std::cell::RefCell;
use std::rc::Rc;

use crate::render::VRenderer;

/// Renderer double whose trees are strings.
pub struct TestRenderer;

impl VRenderer for TestRenderer {
    type Tree = String;
    type Target = RenderTarget;

    fn mount(&self, tree: String, target: &RenderTarget) {
        target.frames.borrow_mut().push(tree);
    }
}

/// Mount point that records every frame mounted onto it.
#[derive(Default)]
pub struct RenderTarget {
    frames: RefCell<Vec<String>>,
}

impl RenderTarget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Every mounted frame, oldest first.
    pub fn frames(&self) -> Vec<String> {
        self.frames.borrow().clone()
    }

    /// The currently mounted frame (the latest), if any.
    pub fn current(&self) -> Option<String> {
        self.frames.borrow().last().cloned()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }
}
