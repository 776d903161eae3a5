// #![include_doc("../README.md", start)]
//! # sigweak
//!
//! Lazily memoized signals with weakly linked dependents.
//!
//! - `State<T>`: a mutable source. Writing a same-valued value does nothing.
//! - `Computed<T>`: a memoized derivation over a fixed list of signals. It is
//!   marked dirty when a source changes and recomputed only when read.
//! - `Sink` (alias `Slot`): a subscriber whose callback runs on a later
//!   `Runtime` turn, at most once per turn.
//!
//! Dependents are held weakly: dropping a `Computed` or `Sink` removes it from
//! the graph without any explicit teardown.
//!
//! ```rust
//! use sigweak::{Computed, Runtime, Sink, State};
//!
//! let mut rt = Runtime::new();
//! let a = State::new(2);
//! let b = Computed::new((a.clone(),), |(a,)| a.get() * 10);
//! let _s = Sink::new((b.clone(),), |(b,)| println!("{:?}", b.get()));
//!
//! assert_eq!(b.get().unwrap(), 20);
//! a.set(3);
//! a.set(4);
//! rt.update(); // prints "Ok(40)" once
//! ```
//!
//! ## License
//!
//! This project is dual licensed under Apache-2.0/MIT.
// #![include_doc("../README.md", end)]
