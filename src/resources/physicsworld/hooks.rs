//! Glue handed to the rapier pipeline during a step: an event collector and
//! the per-collider material hooks (group filtering, restitution threshold).

use std::sync::Mutex;

use rapier2d::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::collider::CollisionFilter;

/// Contact or intersection change reported by rapier, still in engine terms.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawContactEvent {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    pub started: bool,
    pub sensor: bool,
    /// Whether `collider1` is the sensor side. Unknown once a collider has
    /// been removed, in which case it defaults to true.
    pub collider1_is_sensor: bool,
    pub point: Point<Real>,
    pub normal: Vector<Real>,
    pub impulse: Real,
}

/// Buffers rapier collision events for the duration of one step.
#[derive(Default)]
pub(crate) struct EventCollector {
    events: Mutex<Vec<RawContactEvent>>,
}

impl EventCollector {
    pub fn drain(&mut self) -> Vec<RawContactEvent> {
        match self.events.get_mut() {
            Ok(events) => std::mem::take(events),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        }
    }
}

impl EventHandler for EventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        let (collider1, collider2, started) = match event {
            CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
            CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
        };
        let is_sensor = |h: ColliderHandle| colliders.get(h).map(|c| c.is_sensor());
        let collider1_is_sensor = match (is_sensor(collider1), is_sensor(collider2)) {
            (Some(s1), _) => s1,
            (None, Some(s2)) => !s2,
            (None, None) => true,
        };
        let (point, normal, impulse) = contact_pair
            .and_then(|pair| contact_summary(colliders, pair))
            .unwrap_or((Point::origin(), Vector::zeros(), 0.0));

        let raw = RawContactEvent {
            collider1,
            collider2,
            started,
            sensor: event.sensor(),
            collider1_is_sensor,
            point,
            normal,
            impulse,
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(raw);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
        // Contact force events are never enabled on our colliders.
    }
}

/// First contact point, manifold normal and total impulse of a pair.
pub(crate) fn contact_summary(
    colliders: &ColliderSet,
    pair: &ContactPair,
) -> Option<(Point<Real>, Vector<Real>, Real)> {
    let manifold = pair.manifolds.iter().find(|m| !m.points.is_empty())?;
    let collider1 = colliders.get(pair.collider1)?;

    let point = match manifold.data.solver_contacts.first() {
        Some(contact) => contact.point,
        None => collider1.position() * manifold.points[0].local_p1,
    };
    let normal = if manifold.data.normal.norm_squared() > 0.0 {
        manifold.data.normal
    } else {
        collider1.position() * manifold.local_n1
    };
    Some((point, normal, pair.total_impulse_magnitude()))
}

/// Material data the hooks need, per collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ColliderMaterial {
    pub filter: CollisionFilter,
    /// Meters per second.
    pub restitution_threshold: Real,
}

impl ColliderMaterial {
    /// Which rapier hooks this collider needs.
    pub fn active_hooks(&self, restitution: Real) -> ActiveHooks {
        let mut hooks = ActiveHooks::empty();
        if self.filter.group_index != 0 {
            hooks |= ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR;
        }
        if self.restitution_threshold > 0.0 && restitution > 0.0 {
            hooks |= ActiveHooks::MODIFY_SOLVER_CONTACTS;
        }
        hooks
    }

    /// Interaction groups for rapier's own pre-filter.
    ///
    /// Colliders in a group accept everything here and let the pair filter
    /// apply the full group rule, since a positive group overrides masks.
    pub fn interaction_groups(&self) -> InteractionGroups {
        if self.filter.group_index != 0 {
            InteractionGroups::all()
        } else {
            InteractionGroups::new(
                Group::from_bits_truncate(self.filter.category_bits),
                Group::from_bits_truncate(self.filter.mask_bits),
            )
        }
    }
}

pub(crate) struct MaterialHooks<'a> {
    materials: &'a FxHashMap<ColliderHandle, ColliderMaterial>,
}

impl<'a> MaterialHooks<'a> {
    pub fn new(materials: &'a FxHashMap<ColliderHandle, ColliderMaterial>) -> Self {
        Self { materials }
    }

    fn filter(&self, collider: ColliderHandle) -> CollisionFilter {
        self.materials
            .get(&collider)
            .map(|m| m.filter)
            .unwrap_or_default()
    }

    fn should_collide(&self, collider1: ColliderHandle, collider2: ColliderHandle) -> bool {
        self.filter(collider1).should_collide(&self.filter(collider2))
    }

    fn restitution_threshold(&self, collider: ColliderHandle) -> Real {
        self.materials
            .get(&collider)
            .map(|m| m.restitution_threshold)
            .unwrap_or(0.0)
    }
}

impl PhysicsHooks for MaterialHooks<'_> {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        if self.should_collide(context.collider1, context.collider2) {
            Some(SolverFlags::COMPUTE_IMPULSES)
        } else {
            None
        }
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        self.should_collide(context.collider1, context.collider2)
    }

    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let threshold = self
            .restitution_threshold(context.collider1)
            .max(self.restitution_threshold(context.collider2));
        if threshold <= 0.0 {
            return;
        }
        let normal = *context.normal;
        let body1 = context.rigid_body1.and_then(|h| context.bodies.get(h));
        let body2 = context.rigid_body2.and_then(|h| context.bodies.get(h));

        for contact in context.solver_contacts.iter_mut() {
            let v1 = body1
                .map(|b| b.velocity_at_point(&contact.point))
                .unwrap_or_else(Vector::zeros);
            let v2 = body2
                .map(|b| b.velocity_at_point(&contact.point))
                .unwrap_or_else(Vector::zeros);
            let closing_speed = (v1 - v2).dot(&normal);
            if closing_speed < threshold {
                contact.restitution = 0.0;
            }
        }
    }
}
