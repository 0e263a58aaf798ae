//! Common SIMD operations
//!
//! This module provides high-performance SIMD (Single Instruction, Multiple Data) operations
//! optimized for various CPU architectures and instruction sets.
//!
//! # Supported Architectures
//!
//! ## x86_64
//! - **SSE** (Streaming SIMD Extensions): 128-bit vectors
//! - **SSE2**: Enhanced 128-bit integer operations
//! - **SSE3**: Additional 128-bit operations
//! - **SSSE3**: Supplemental 128-bit operations
//! - **SSE4.1**: 128-bit operations with additional instructions
//! - **SSE4.2**: 128-bit operations with string/text processing
//! - **AVX** (Advanced Vector Extensions): 256-bit floating-point operations
//! - **AVX2**: 256-bit integer operations
//! - **AVX-512**: 512-bit operations (F, BW, DQ, VL extensions)
//!
//! ## aarch64 (ARM)
//! - **NEON**: 128-bit SIMD operations
//! - **SVE** (Scalable Vector Extension): Variable-length vectors (future support)
//! - **SVE2**: Enhanced SVE operations (future support)
//!
//! # Modules
//!
//! - [`xor`]: Vector XOR operations, used for OOXML font deobfuscation
//!
//! # Performance Considerations
//!
//! This module is designed with performance as the top priority:
//!
//! - **Runtime Feature Detection**: Automatically selects the best available instruction set
//! - **Zero-Copy Operations**: Leverages Rust's ownership system to avoid unnecessary allocations
//! - **Inline Functions**: All hot-path functions are marked `#[inline]` for optimal performance
//! - **Cache-Friendly**: Operations are designed to maximize CPU cache utilization
//! - **Minimal Overhead**: Direct mapping to hardware instructions where possible
//!
//! # Examples
//!
//! ```rust
//! use litchi::common::simd::xor::xor_32_bytes_inplace;
//!
//! let mut data = [0u8; 32];
//! let key = [0xAAu8; 16];
//! xor_32_bytes_inplace(&mut data, &key);
//! ```
//!
//! # Safety
//!
//! Functions using SIMD intrinsics are marked as `unsafe` when they require specific CPU features.
//! High-level API functions perform runtime feature detection to ensure safety across different CPUs.
//!
//! When using low-level intrinsics directly, ensure the target CPU supports the required features
//! either through:
//! - Runtime detection with `is_x86_feature_detected!()` or similar
//! - Compile-time target features: `#[target_feature(enable = "avx2")]`
//! - Compiler flags: `RUSTFLAGS="-C target-feature=+avx2"`

pub mod xor;
