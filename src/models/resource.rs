//! Resource model.
//!
//! Resources are the bookable entities a schedule entry claims: rooms and
//! instructors. Both kinds are checked for conflicts with the same
//! algorithm; the detector only needs to know which [`Axis`] a reference
//! belongs to and its identifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The independent resource axes an entry can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Physical room.
    Room,
    /// Teaching staff member.
    Instructor,
}

impl Axis {
    /// Every axis, in scan order.
    pub const ALL: [Axis; 2] = [Axis::Room, Axis::Instructor];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Room => f.write_str("room"),
            Axis::Instructor => f.write_str("instructor"),
        }
    }
}

/// A reference to one bookable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    /// A room by id.
    Room(String),
    /// An instructor by id.
    Instructor(String),
}

impl ResourceRef {
    /// References a room.
    pub fn room(id: impl Into<String>) -> Self {
        Self::Room(id.into())
    }

    /// References an instructor.
    pub fn instructor(id: impl Into<String>) -> Self {
        Self::Instructor(id.into())
    }

    /// Builds a reference on a given axis.
    pub fn on(axis: Axis, id: impl Into<String>) -> Self {
        match axis {
            Axis::Room => Self::Room(id.into()),
            Axis::Instructor => Self::Instructor(id.into()),
        }
    }

    /// The axis this reference belongs to.
    pub fn axis(&self) -> Axis {
        match self {
            Self::Room(_) => Axis::Room,
            Self::Instructor(_) => Axis::Instructor,
        }
    }

    /// The resource identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Room(id) | Self::Instructor(id) => id,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.axis(), self.id())
    }
}

/// Capability shared by every bookable resource kind.
pub trait Bookable {
    /// Stable identity of the resource.
    fn resource_ref(&self) -> ResourceRef;

    /// Whether new bookings may claim this resource.
    fn is_bookable(&self) -> bool;
}

/// A room that sessions can be held in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Seating capacity.
    pub capacity: u32,
    /// Whether the room is in service.
    pub active: bool,
    /// Domain-specific metadata (building, equipment, ...).
    pub attributes: HashMap<String, String>,
}

impl Room {
    /// Creates an active room.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity: 0,
            active: true,
            attributes: HashMap::new(),
        }
    }

    /// Sets the room name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Takes the room out of service.
    pub fn retired(mut self) -> Self {
        self.active = false;
        self
    }
}

impl Bookable for Room {
    fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Room(self.id.clone())
    }

    fn is_bookable(&self) -> bool {
        self.active
    }
}

/// An instructor who teaches sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instructor {
    /// Unique instructor identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the instructor is currently employed.
    pub active: bool,
}

impl Instructor {
    /// Creates an active instructor.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            active: true,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the instructor as no longer employed.
    pub fn retired(mut self) -> Self {
        self.active = false;
        self
    }
}

impl Bookable for Instructor {
    fn resource_ref(&self) -> ResourceRef {
        ResourceRef::Instructor(self.id.clone())
    }

    fn is_bookable(&self) -> bool {
        self.active
    }
}

/// Registry of the rooms and instructors known to the scheduler.
///
/// The scheduler never owns resource lifecycle; the registry is a read-only
/// mirror of the collaborators' master data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceRegistry {
    rooms: Vec<Room>,
    instructors: Vec<Instructor>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a room.
    pub fn push_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    /// Registers an instructor.
    pub fn push_instructor(&mut self, instructor: Instructor) {
        self.instructors.push(instructor);
    }

    /// Looks up a room by id.
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Looks up an instructor by id.
    pub fn instructor(&self, id: &str) -> Option<&Instructor> {
        self.instructors.iter().find(|i| i.id == id)
    }

    /// Resolves a reference to its bookable record.
    pub fn lookup(&self, resource: &ResourceRef) -> Option<&dyn Bookable> {
        match resource {
            ResourceRef::Room(id) => self.room(id).map(|r| r as &dyn Bookable),
            ResourceRef::Instructor(id) => self.instructor(id).map(|i| i as &dyn Bookable),
        }
    }

    /// All registered rooms.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// All registered instructors.
    pub fn instructors(&self) -> &[Instructor] {
        &self.instructors
    }
}
