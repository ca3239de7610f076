//! Integration tests for story reading, walking and whole builds.

mod walker_tests;
