//! # HTTP Commands
//!
//! Handlers grouped by who uses them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Module       Routes                          Capability                │
//! │  ───────────  ──────────────────────────────  ──────────                │
//! │  pages        /  /login  /signup  /unauthorized  /dashboard             │
//! │  auth         /api/auth/*  /api/me            Public / Pos              │
//! │  pos          /api/pos/*                      Pos                       │
//! │  dashboard    /api/dashboard/*                Admin                     │
//! │  health       /healthcheck                    Public                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Page routes return JSON view models; rendering is the front end's job.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod pages;
pub mod pos;

use chrono::Utc;
use serde::Serialize;

use sonho_core::{Cart, CartItem, CartPhase, Notification, PaymentMethod};

use crate::state::PosSession;

/// The cart as the POS screen draws it.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub phase: CartPhase,
    pub payment_method: PaymentMethod,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            items: cart.items().to_vec(),
            item_count: cart.items().iter().map(|i| i.quantity).sum(),
            subtotal_cents: cart.subtotal().cents(),
            discount_cents: cart.discount().cents(),
            total_cents: cart.total().cents(),
            phase: cart.phase(),
            payment_method: cart.payment_method(),
        }
    }
}

/// Response of every cart command: the cart after the command, plus the
/// notifications still on screen.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub cart: CartView,
    pub notifications: Vec<Notification>,
}

impl SessionView {
    pub fn of(session: &mut PosSession) -> Self {
        SessionView {
            cart: CartView::from(&session.cart),
            notifications: session.notifications.active(Utc::now()),
        }
    }
}
