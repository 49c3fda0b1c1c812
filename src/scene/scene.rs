use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::animation::animatable::AnimatableHandle;
use crate::animation::group::AnimationGroup;
use crate::animation::scheduler::AnimationScheduler;
use crate::animation::target::TargetHandle;
use crate::errors::Result;
use crate::scene::node::Node;
use crate::utils::time::Timer;

/// Shared handle to a scene node.
pub type NodeHandle = Rc<RefCell<Node>>;

/// Container of nodes plus the animation scheduler that drives them.
///
/// The scene is the frame-loop consumer of the animation engine: the host
/// calls [`tick`](Self::tick) (real time) or [`animate`](Self::animate)
/// (explicit delta) once per frame.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<NodeHandle>,
    pub animation_scheduler: AnimationScheduler,
    timer: Timer,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node and registers it with the scene.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeHandle {
        let node = Rc::new(RefCell::new(Node::new(name)));
        self.nodes.push(Rc::clone(&node));
        node
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    #[must_use]
    pub fn get_node_by_id(&self, id: u64) -> Option<NodeHandle> {
        self.nodes.iter().find(|n| n.borrow().id() == id).cloned()
    }

    #[must_use]
    pub fn get_node_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes.iter().find(|n| n.borrow().name == name).cloned()
    }

    /// Upcasts a node handle into the animation-target handle the
    /// scheduler works with.
    #[must_use]
    pub fn target_of(node: &NodeHandle) -> TargetHandle {
        let node: NodeHandle = Rc::clone(node);
        node
    }

    /// Advances animations by real elapsed time since the previous tick.
    pub fn tick(&mut self) {
        self.timer.tick();
        self.animation_scheduler.animate(self.timer.dt_seconds());
    }

    /// Advances animations by an explicit delta, for deterministic stepping.
    pub fn animate(&mut self, delta_seconds: f32) {
        self.animation_scheduler.animate(delta_seconds);
    }

    /// Starts the tracks attached to `node`.
    pub fn begin_animation(
        &mut self,
        node: &NodeHandle,
        from_frame: f32,
        to_frame: f32,
        loop_animation: bool,
        speed_ratio: f32,
    ) -> Result<AnimatableHandle> {
        self.animation_scheduler.begin_animation(
            &Self::target_of(node),
            from_frame,
            to_frame,
            loop_animation,
            speed_ratio,
            None,
        )
    }

    /// Rebuilds an animation group from its serialized form, resolving
    /// target ids against this scene's nodes.
    pub fn parse_animation_group(&self, parsed: &Value) -> Result<AnimationGroup> {
        AnimationGroup::parse(parsed, |id| {
            self.get_node_by_id(id).map(|node| Self::target_of(&node))
        })
    }
}
