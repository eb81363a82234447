// Pointer drag over the range chart.
//
// The controller is a small state machine: entering a drag attaches exactly one move
// listener on the surface, leaving it (pointer-up or drop) detaches that same listener.

use crate::engine::range::ClampPolicy;
use crate::models::PriceRange;

/// Vertical extent of the chart in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub top: f64,
    pub height: f64,
}

/// Prices displayed at the top and bottom edge of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScale {
    pub max_display_price: f64,
    pub min_display_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    Min,
    Max,
}

/// Whatever delivers pointer-move events. `Listener` is the registration token.
pub trait PointerSurface {
    type Listener;

    fn attach_move_listener(&mut self) -> Self::Listener;
    fn detach_move_listener(&mut self, listener: Self::Listener);
}

#[derive(Debug)]
pub enum DragState<L> {
    Idle,
    DraggingMin(L),
    DraggingMax(L),
}

pub struct RangeDragController<S: PointerSurface> {
    surface: S,
    state: DragState<S::Listener>,
    bounds: ChartBounds,
    scale: ChartScale,
    policy: ClampPolicy,
}

impl<S: PointerSurface> RangeDragController<S> {
    pub fn new(surface: S, bounds: ChartBounds, scale: ChartScale, policy: ClampPolicy) -> Self {
        Self { surface, state: DragState::Idle, bounds, scale, policy }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn active_handle(&self) -> Option<DragHandle> {
        match self.state {
            DragState::Idle => None,
            DragState::DraggingMin(_) => Some(DragHandle::Min),
            DragState::DraggingMax(_) => Some(DragHandle::Max),
        }
    }

    /// Starts a gesture. Ignored while another handle is being dragged.
    pub fn pointer_down(&mut self, handle: DragHandle) -> bool {
        if !matches!(self.state, DragState::Idle) {
            return false;
        }
        let listener = self.surface.attach_move_listener();
        self.state = match handle {
            DragHandle::Min => DragState::DraggingMin(listener),
            DragHandle::Max => DragState::DraggingMax(listener),
        };
        true
    }

    /// Linear interpolation from the top edge (max display price) to the bottom edge.
    pub fn price_at(&self, y: f64) -> f64 {
        if self.bounds.height <= 0.0 {
            return self.scale.max_display_price;
        }
        let ratio = ((y - self.bounds.top) / self.bounds.height).clamp(0.0, 1.0);
        self.scale.max_display_price - ratio * (self.scale.max_display_price - self.scale.min_display_price)
    }

    /// Moves the active handle to the pointer, clamped against the other handle and the
    /// current price bands. Returns `None` when no drag is in progress.
    pub fn pointer_move(&self, y: f64, range: PriceRange, current_price: f64) -> Option<PriceRange> {
        let candidate = self.price_at(y);
        let buffer = self.policy.buffer(&range);
        match self.state {
            DragState::Idle => None,
            DragState::DraggingMin(_) => {
                let min_price = self.policy.clamp_min(candidate, range.max_price, current_price, buffer);
                Some(PriceRange::new(min_price, range.max_price))
            }
            DragState::DraggingMax(_) => {
                let max_price = self.policy.clamp_max(candidate, range.min_price, current_price, buffer);
                Some(PriceRange::new(range.min_price, max_price))
            }
        }
    }

    /// Ends the gesture. Returns the handle that was released, if any.
    pub fn pointer_up(&mut self) -> Option<DragHandle> {
        let released = self.active_handle();
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => {}
            DragState::DraggingMin(listener) | DragState::DraggingMax(listener) => {
                self.surface.detach_move_listener(listener);
            }
        }
        released
    }
}

impl<S: PointerSurface> Drop for RangeDragController<S> {
    fn drop(&mut self) {
        self.pointer_up();
    }
}
