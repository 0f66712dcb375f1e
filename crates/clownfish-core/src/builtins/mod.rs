//! Built-in classes.
//!
//! Each submodule holds the instance variables of one class and the free
//! functions that operate on its objects. Functions that receive an object of
//! the wrong class raise a foreign exception.

pub mod blob;
pub mod boolean;
pub mod bytebuf;
pub mod float;
pub mod hash;
pub mod integer;
pub mod string;
pub mod vector;
