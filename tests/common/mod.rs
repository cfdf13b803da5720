pub mod synthetic_strip;
