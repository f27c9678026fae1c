use super::{AnimationController, BoneSnapshot};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Typed key into the [`AnimationState`] data bag.
pub struct DataTicket<T> {
    id: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DataTicket<T> {
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }
}

impl<T> Clone for DataTicket<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DataTicket<T> {}

impl<T> fmt::Debug for DataTicket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataTicket").field(&self.id).finish()
    }
}

/// Per-tick state handed to controllers by the host.
#[derive(Default)]
pub struct AnimationState {
    pub limb_swing: f64,
    pub limb_swing_amount: f64,
    pub partial_tick: f64,
    pub is_moving: bool,
    data: HashMap<&'static str, Box<dyn Any + Send>>,
}

impl AnimationState {
    pub fn new(limb_swing: f64, limb_swing_amount: f64, partial_tick: f64, is_moving: bool) -> Self {
        Self {
            limb_swing,
            limb_swing_amount,
            partial_tick,
            is_moving,
            data: HashMap::new(),
        }
    }

    pub fn set_data<T: Any + Send>(&mut self, ticket: DataTicket<T>, value: T) {
        self.data.insert(ticket.id, Box::new(value));
    }

    /// `None` when nothing is stored under the ticket or the stored value has another type.
    pub fn data<T: Any>(&self, ticket: DataTicket<T>) -> Option<&T> {
        self.data.get(ticket.id)?.downcast_ref::<T>()
    }

    pub fn data_mut<T: Any>(&mut self, ticket: DataTicket<T>) -> Option<&mut T> {
        self.data.get_mut(ticket.id)?.downcast_mut::<T>()
    }

    pub fn remove_data<T: Any>(&mut self, ticket: DataTicket<T>) -> Option<T> {
        let value = self.data.remove(ticket.id)?;
        match value.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(value) => {
                self.data.insert(ticket.id, value);
                None
            }
        }
    }

    pub fn clear_data(&mut self) {
        self.data.clear();
    }
}

impl fmt::Debug for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationState")
            .field("limb_swing", &self.limb_swing)
            .field("limb_swing_amount", &self.limb_swing_amount)
            .field("partial_tick", &self.partial_tick)
            .field("is_moving", &self.is_moving)
            .field("data", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Animation state owned by a single animatable: its controllers, in processing order,
/// and the snapshots of every bone it has seen.
pub struct AnimatableManager<A> {
    pub(crate) controllers: Vec<AnimationController<A>>,
    pub(crate) snapshots: HashMap<String, BoneSnapshot>,
    first_tick: bool,
}

impl<A> Default for AnimatableManager<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> AnimatableManager<A> {
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
            snapshots: HashMap::new(),
            first_tick: true,
        }
    }

    pub fn with_controller(mut self, controller: AnimationController<A>) -> Self {
        self.add_controller(controller);
        self
    }

    /// Adds `controller`, replacing any controller with the same name.
    pub fn add_controller(&mut self, controller: AnimationController<A>) {
        match self
            .controllers
            .iter()
            .position(|c| c.name() == controller.name())
        {
            Some(index) => self.controllers[index] = controller,
            None => self.controllers.push(controller),
        }
    }

    pub fn controller(&self, name: &str) -> Option<&AnimationController<A>> {
        self.controllers.iter().find(|c| c.name() == name)
    }

    pub fn controller_mut(&mut self, name: &str) -> Option<&mut AnimationController<A>> {
        self.controllers.iter_mut().find(|c| c.name() == name)
    }

    pub fn controllers(&self) -> &[AnimationController<A>] {
        &self.controllers
    }

    pub fn controllers_mut(&mut self) -> &mut [AnimationController<A>] {
        &mut self.controllers
    }

    pub fn snapshot(&self, bone_name: &str) -> Option<&BoneSnapshot> {
        self.snapshots.get(bone_name)
    }

    pub fn snapshots(&self) -> &HashMap<String, BoneSnapshot> {
        &self.snapshots
    }

    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
    }

    pub fn is_first_tick(&self) -> bool {
        self.first_tick
    }

    pub fn finish_first_tick(&mut self) {
        self.first_tick = false;
    }

    /// Fires the named trigger on `controller`, or on every controller that knows it
    /// when `controller` is `None`. Returns whether any controller accepted it.
    pub fn trigger_animation(&mut self, controller: Option<&str>, trigger: &str) -> bool {
        let mut triggered = false;
        for candidate in &mut self.controllers {
            if controller.is_some_and(|name| name != candidate.name()) {
                continue;
            }
            triggered |= candidate.trigger_animation(trigger);
        }
        triggered
    }

    pub fn stop_triggered_animations(&mut self) {
        for controller in &mut self.controllers {
            if controller.triggered_animation().is_some() {
                controller.stop();
            }
        }
    }
}

impl<A> fmt::Debug for AnimatableManager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatableManager")
            .field("controllers", &self.controllers)
            .field("snapshots", &self.snapshots.len())
            .field("first_tick", &self.first_tick)
            .finish()
    }
}
