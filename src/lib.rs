//! Space Invaders and Memory Maze demo games.
//!
//! The shooter runs on a fixed-timestep loop: [`driver::Driver`] drains
//! real time into [`compute::step`] calls and renders once per display
//! frame onto any [`render::Surface`].  Memory Maze is a small timed state
//! machine in [`memory_maze`].  Neither game performs I/O; hosts supply the
//! clock, input and drawing surface.

pub mod compute;
pub mod config;
pub mod driver;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod input;
pub mod memory_maze;
pub mod pool;
pub mod positions;
pub mod render;
pub mod spawn;
pub mod telemetry;
