//! Video Transcription & Subtitle Translation Service
//!
//! This library provides the core functionality for the vidsub system:
//! background job orchestration over a media pipeline (extract, transcribe,
//! subtitle, translate, render) with dual-tier LRU caching of whole-job
//! results and per-segment translations.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
