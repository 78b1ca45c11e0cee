use std::fmt;

use glam::Vec2;

use crate::body::RigidBody;
use crate::types::{Directive, DrawCall, EntityId, EntityTag};
use crate::vector::Vector3;

/// What an entity learns about the other side of a resolved collision.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    pub other: EntityId,
    pub other_tag: EntityTag,
    /// The other body as it stands after resolution.
    pub other_body: RigidBody,
    /// Contact normal pointing from the receiver toward `other`.
    pub normal: Vector3,
}

/// Capability interface every entity kind implements.
///
/// Hooks must not rely on physical state of other entities staying fixed
/// until the next tick; `collided` in particular only sees a snapshot.
pub trait Behavior {
    fn tag(&self) -> EntityTag {
        EntityTag::Object
    }

    /// Called once per tick after gravity has been staged. The default integrates the body.
    fn update(&mut self, body: &mut RigidBody) -> Directive {
        body.integrate();
        Directive::Keep
    }

    /// Push this entity's draw calls. The default draws one sprite at the projected position.
    fn render(&self, id: EntityId, body: &RigidBody, screen_offset: Vec2, scale: f32, out: &mut Vec<DrawCall>) {
        out.push(DrawCall::Sprite { id, at: project(body, screen_offset), scale });
    }

    /// Game-specific reaction to a resolved collision (damage, triggers, ...).
    fn collided(&mut self, _contact: &Contact) -> Directive {
        Directive::Keep
    }
}

/// Screen-space position of a body: elevation lifts it up the screen.
#[inline]
pub fn project(body: &RigidBody, screen_offset: Vec2) -> Vec2 {
    let p = body.position();
    Vec2::new(p.x - screen_offset.x, p.y - p.z - screen_offset.y)
}

/// Level geometry: walls, floors, ceilings. Invisible and inert.
#[derive(Copy, Clone, Debug, Default)]
pub struct Boundary;

impl Behavior for Boundary {
    fn tag(&self) -> EntityTag {
        EntityTag::Boundary
    }

    fn render(&self, _id: EntityId, _body: &RigidBody, _offset: Vec2, _scale: f32, _out: &mut Vec<DrawCall>) {}
}

/// A walking character with a ground shadow. Keeps a tally of what it bumped into.
#[derive(Clone, Debug, Default)]
pub struct Character {
    contacts: u32,
    last_contact: Option<EntityId>,
}

impl Character {
    /// Number of resolved collisions so far.
    pub fn contacts(&self) -> u32 {
        self.contacts
    }

    pub fn last_contact(&self) -> Option<EntityId> {
        self.last_contact
    }
}

impl Behavior for Character {
    fn render(&self, id: EntityId, body: &RigidBody, screen_offset: Vec2, scale: f32, out: &mut Vec<DrawCall>) {
        let p = body.position();
        let d = body.dims();
        out.push(DrawCall::Shadow {
            id,
            center: Vec2::new(p.x, p.y),
            radii: Vec2::new(d.x / 2.0 * 1.3, d.y / 2.0 * 1.2),
        });
        out.push(DrawCall::Sprite { id, at: project(body, screen_offset), scale });
    }

    fn collided(&mut self, contact: &Contact) -> Directive {
        self.contacts += 1;
        self.last_contact = Some(contact.other);
        Directive::Keep
    }
}

/// Closed set of entity kinds, plus an escape hatch for game code.
pub enum EntityKind {
    Boundary(Boundary),
    Character(Character),
    Scripted(Box<dyn Behavior>),
}

impl fmt::Debug for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Boundary(b) => f.debug_tuple("Boundary").field(b).finish(),
            EntityKind::Character(c) => f.debug_tuple("Character").field(c).finish(),
            EntityKind::Scripted(s) => write!(f, "Scripted({:?})", s.tag()),
        }
    }
}

impl Behavior for EntityKind {
    fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Boundary(b) => b.tag(),
            EntityKind::Character(c) => c.tag(),
            EntityKind::Scripted(s) => s.tag(),
        }
    }

    fn update(&mut self, body: &mut RigidBody) -> Directive {
        match self {
            EntityKind::Boundary(b) => b.update(body),
            EntityKind::Character(c) => c.update(body),
            EntityKind::Scripted(s) => s.update(body),
        }
    }

    fn render(&self, id: EntityId, body: &RigidBody, screen_offset: Vec2, scale: f32, out: &mut Vec<DrawCall>) {
        match self {
            EntityKind::Boundary(b) => b.render(id, body, screen_offset, scale, out),
            EntityKind::Character(c) => c.render(id, body, screen_offset, scale, out),
            EntityKind::Scripted(s) => s.render(id, body, screen_offset, scale, out),
        }
    }

    fn collided(&mut self, contact: &Contact) -> Directive {
        match self {
            EntityKind::Boundary(b) => b.collided(contact),
            EntityKind::Character(c) => c.collided(contact),
            EntityKind::Scripted(s) => s.collided(contact),
        }
    }
}

/// One simulated object: a body plus identity, liveness and a render offset.
#[derive(Debug)]
pub struct Entity {
    kind: EntityKind,
    body: RigidBody,
    alive: bool,
    screen_offset: Vec2,
}

impl Entity {
    pub fn new(kind: EntityKind, body: RigidBody, screen_offset: Vec2) -> Self {
        Self { kind, body, alive: true, screen_offset }
    }

    /// Invisible level geometry around `body`.
    pub fn barrier(body: RigidBody) -> Self {
        Self::new(EntityKind::Boundary(Boundary), body, Vec2::ZERO)
    }

    /// Character at the origin with the stock humanoid body.
    pub fn character() -> Self {
        let body = RigidBody::new(Vector3::ZERO, Vector3::new(32.0, 10.0, 64.0))
            .with_mass(50.0)
            .with_restitution(0.25)
            .with_friction(0.6, 0.7);
        Self::new(EntityKind::Character(Character::default()), body, Vec2::new(32.0, 32.0))
    }

    pub fn scripted(behavior: Box<dyn Behavior>, body: RigidBody) -> Self {
        Self::new(EntityKind::Scripted(behavior), body, Vec2::ZERO)
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    pub fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    /// Snapshot of the body.
    pub fn body(&self) -> RigidBody {
        self.body
    }

    pub fn body_mut(&mut self) -> &mut RigidBody {
        &mut self.body
    }

    pub fn set_body(&mut self, body: RigidBody) {
        self.body = body;
    }

    pub fn position(&self) -> Vector3 {
        self.body.position()
    }

    pub fn set_position(&mut self, p: Vector3) {
        self.body.set_position(p);
    }

    pub fn apply_force(&mut self, force: Vector3) {
        self.body.apply_force(force);
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    /// Dead entities never collide.
    pub fn is_collidable(&self) -> bool {
        self.alive && self.body.is_collidable()
    }

    pub fn screen_offset(&self) -> Vec2 {
        self.screen_offset
    }

    pub fn set_screen_offset(&mut self, offset: Vec2) {
        self.screen_offset = offset;
    }

    /// Body overlap between two live entities.
    pub fn check_collision(&self, other: &Entity) -> bool {
        self.alive && other.alive && self.body.check_collision(&other.body)
    }

    pub(crate) fn update(&mut self) -> Directive {
        self.kind.update(&mut self.body)
    }

    pub(crate) fn collided(&mut self, contact: &Contact) -> Directive {
        self.kind.collided(contact)
    }

    pub(crate) fn render(&self, id: EntityId, scale: f32, out: &mut Vec<DrawCall>) {
        self.kind.render(id, &self.body, self.screen_offset, scale, out);
    }
}
