#![forbid(unsafe_code)]

//! Ordered action collection with at most one cancel action.
//!
//! Insertion order is on-screen order. Regular actions come first; the
//! cancel action, when present, is always laid out last.
//!
//! # Invariants
//!
//! - The cancel sub-group holds 0 or 1 actions.
//! - Each action instance appears at most once.
//! - Every member has exactly one bound [`ActionView`].
//! - Adding, removing, or toggling an action marks the group as needing
//!   layout.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use drape_core::Orientation;

use super::{Action, ActionId, ActionView};
use crate::config::{ActionLayoutType, ActionViewType};
use crate::coordinator::LayoutParticipant;

/// Columns between horizontally laid out actions.
const ACTION_SPACING: i32 = 1;

/// Why [`ActionGroup::add_action`] refused an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRejected {
    /// The group already holds a cancel action.
    DuplicateCancel,
    /// This action instance is already in the group.
    AlreadyPresent,
}

impl fmt::Display for ActionRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCancel => write!(f, "group already has a cancel action"),
            Self::AlreadyPresent => write!(f, "action is already in the group"),
        }
    }
}

impl std::error::Error for ActionRejected {}

/// Resolved arrangement of the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionAxis {
    #[default]
    Horizontal,
    Vertical,
}

/// Mutable, ordered set of actions bound one-to-one to views.
pub struct ActionGroup {
    actions: Vec<Action>,
    cancel: Option<Action>,
    views: AHashMap<ActionId, ActionView>,
    layout_type: ActionLayoutType,
    view_type: ActionViewType,
    dirty: Rc<Cell<bool>>,
    axis: ActionAxis,
    last_reflow: Option<(i32, Orientation)>,
    reflow_count: u64,
}

impl Default for ActionGroup {
    fn default() -> Self {
        Self::new(ActionLayoutType::default(), ActionViewType::default())
    }
}

impl ActionGroup {
    pub fn new(layout_type: ActionLayoutType, view_type: ActionViewType) -> Self {
        Self {
            actions: Vec::new(),
            cancel: None,
            views: AHashMap::new(),
            layout_type,
            view_type,
            dirty: Rc::new(Cell::new(false)),
            axis: ActionAxis::default(),
            last_reflow: None,
            reflow_count: 0,
        }
    }

    /// Append `action` to its sub-group and bind a view to it.
    pub fn add_action(&mut self, action: Action) -> Result<(), ActionRejected> {
        if self.contains(&action) {
            tracing::debug!(action.id = action.id().id(), "action already present");
            return Err(ActionRejected::AlreadyPresent);
        }
        if action.is_cancel() && self.cancel.is_some() {
            tracing::debug!(action.id = action.id().id(), "duplicate cancel action");
            return Err(ActionRejected::DuplicateCancel);
        }

        let dirty = Rc::clone(&self.dirty);
        let view = ActionView::bind(&action, self.view_type, move || dirty.set(true));
        self.views.insert(action.id(), view);
        tracing::debug!(
            action.id = action.id().id(),
            style = ?action.style(),
            "action added"
        );
        if action.is_cancel() {
            self.cancel = Some(action);
        } else {
            self.actions.push(action);
        }
        self.dirty.set(true);
        Ok(())
    }

    /// Remove `action`. Returns whether it was a member.
    pub fn remove_action(&mut self, action: &Action) -> bool {
        let removed = if self.cancel.as_ref().is_some_and(|c| c.ptr_eq(action)) {
            self.cancel = None;
            true
        } else if let Some(index) = self.actions.iter().position(|a| a.ptr_eq(action)) {
            self.actions.remove(index);
            true
        } else {
            false
        };
        if removed {
            self.views.remove(&action.id());
            self.dirty.set(true);
        }
        removed
    }

    pub fn contains(&self, action: &Action) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.ptr_eq(action))
            || self.actions.iter().any(|a| a.ptr_eq(action))
    }

    /// Regular actions in insertion order.
    pub fn regular_actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn cancel_action(&self) -> Option<&Action> {
        self.cancel.as_ref()
    }

    /// All actions in on-screen order (cancel last).
    pub fn actions(&self) -> Vec<Action> {
        self.actions.iter().chain(self.cancel.as_ref()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len() + usize::from(self.cancel.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View bound to `action`, if it is a member.
    pub fn view(&self, action: &Action) -> Option<&ActionView> {
        if self.contains(action) {
            self.views.get(&action.id())
        } else {
            None
        }
    }

    /// Views in on-screen order.
    pub fn views(&self) -> impl Iterator<Item = &ActionView> + '_ {
        self.actions
            .iter()
            .chain(self.cancel.as_ref())
            .filter_map(|a| self.views.get(&a.id()))
    }

    #[inline]
    pub fn layout_type(&self) -> ActionLayoutType {
        self.layout_type
    }

    pub fn set_layout_type(&mut self, layout_type: ActionLayoutType) {
        if self.layout_type != layout_type {
            self.layout_type = layout_type;
            self.dirty.set(true);
        }
    }

    #[inline]
    pub fn view_type(&self) -> ActionViewType {
        self.view_type
    }

    pub fn needs_layout(&self) -> bool {
        self.dirty.get()
    }

    /// Clear the dirty flag, returning its previous value.
    pub fn take_needs_layout(&self) -> bool {
        self.dirty.replace(false)
    }

    /// Width of the whole group laid out in a single row.
    pub fn natural_width(&self) -> i32 {
        let n = i32::try_from(self.len()).unwrap_or(i32::MAX);
        if n == 0 {
            return 0;
        }
        match self.layout_type {
            ActionLayoutType::Vertical => self.views().map(ActionView::width).max().unwrap_or(0),
            ActionLayoutType::Auto | ActionLayoutType::Horizontal => {
                self.views().map(ActionView::width).sum::<i32>() + ACTION_SPACING * (n - 1)
            }
        }
    }

    /// Arrangement the group uses at `width`.
    pub fn axis_for(&self, width: i32) -> ActionAxis {
        match self.layout_type {
            ActionLayoutType::Horizontal => ActionAxis::Horizontal,
            ActionLayoutType::Vertical => ActionAxis::Vertical,
            ActionLayoutType::Auto => {
                if self.natural_width() <= width {
                    ActionAxis::Horizontal
                } else {
                    ActionAxis::Vertical
                }
            }
        }
    }

    /// Rows the group occupies at `width`.
    pub fn height_for(&self, width: i32) -> i32 {
        if self.is_empty() {
            return 0;
        }
        match self.axis_for(width) {
            ActionAxis::Horizontal => 1,
            ActionAxis::Vertical => i32::try_from(self.len()).unwrap_or(i32::MAX),
        }
    }

    /// Arrangement chosen by the last reflow.
    #[inline]
    pub fn axis(&self) -> ActionAxis {
        self.axis
    }

    /// Width and orientation of the last reflow.
    #[inline]
    pub fn last_reflow(&self) -> Option<(i32, Orientation)> {
        self.last_reflow
    }

    /// Number of reflows received so far.
    #[inline]
    pub fn reflow_count(&self) -> u64 {
        self.reflow_count
    }
}

impl LayoutParticipant for ActionGroup {
    fn reflow(&mut self, width: i32, orientation: Orientation) {
        self.axis = self.axis_for(width);
        self.last_reflow = Some((width, orientation));
        self.reflow_count += 1;
        tracing::trace!(width, ?orientation, axis = ?self.axis, "action group reflow");
    }
}

impl fmt::Debug for ActionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionGroup")
            .field("actions", &self.actions)
            .field("cancel", &self.cancel)
            .field("layout_type", &self.layout_type)
            .field("axis", &self.axis)
            .finish()
    }
}
