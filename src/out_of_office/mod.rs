//! Mailbox auto-replies for approved leave.
//!
//! A periodic run loads the requests near their leave window, plans an
//! action for each from its persisted status and pushes or clears the reply
//! through a [`mailbox::MailboxClient`].

pub mod mailbox;
pub mod planner;
pub mod runner;
pub mod store;
