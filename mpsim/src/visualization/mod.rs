pub mod mpsim_vis2d;
