//! This module defines the client used to file tickets into Backlog.
pub mod client;
pub mod types;

pub use client::{BacklogClient, BacklogError, TicketTracker};
pub use types::{Attachment, ItemKind, NamedItem, NewTicket, Project, ProjectData, Ticket};
