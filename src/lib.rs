//! # Pulsly Client Core
//!
//! The engineered core of the Pulsly client, extracted from the view layer:
//! deploy-update coordination and the photo edit pipeline. Everything above
//! this crate is declarative UI glue; everything here is testable without a
//! browser.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`update`] | Tracks whether a newer deployed build is waiting, polls for it through an injectable platform, mediates the apply/reload decision |
//! | [`editor`] | Interactive adjust + crop of a single photo over a fixed 400x400 canvas, producing a new encoded image |
//! | [`types`] | Entities exchanged with the parent profile form (`Photo`) |
//!
//! The two subsystems share no data or control flow; they live together
//! because they are the two parts of the client with real invariants.
//!
//! # Design Decisions
//!
//! ## Injectable Platform
//!
//! The original client reached a module-global worker registration directly.
//! Here the platform is the [`update::WorkerPlatform`] trait with one
//! production implementation per process
//! ([`update::FsWorkerPlatform`], polling a deploy manifest on disk) and a
//! recording mock for tests. No behavior is lost by constructing it
//! explicitly, and every lifecycle scenario becomes a unit test.
//!
//! ## One-Way Update Latch
//!
//! `update_available` only ever latches on. Timer, visibility, and focus
//! triggers may interleave arbitrarily; the worst case is a redundant check,
//! never an inconsistent state. Only the reload that ends the session clears
//! the flag.
//!
//! ## Crop Commits As The New Baseline
//!
//! A committed crop immediately replaces the session's source image. Crop is
//! never combined with rotation/zoom — it operates on the unrotated,
//! unscaled preview so the rectangle's coordinates stay WYSIWYG — and
//! rotation/zoom carry forward onto the new baseline.
//!
//! ## Pure Rendering
//!
//! The preview renderer is a pure function of (source, parameters). The
//! `image` crate has no arbitrary-angle rotation, so the composite
//! rotate/zoom/fit transform is an inverse-mapping loop with bilinear
//! sampling — hand-rolled pixel work, statically linked, no system
//! dependencies.

pub mod editor;
pub mod types;
pub mod update;
