//! The owned fluid solver: grid state plus the step sequencing.

use spate_core::{ConfigError, Simulation, SpatialError};

use crate::field::FieldPair;
use crate::kernels::{add_scaled, advect, diffuse, project, Boundary};
use crate::snapshot::{CellState, Snapshot};

/// Largest force component magnitude [`FluidSolver::apply_force`] accepts.
pub const MAX_FORCE_VELOCITY: f64 = 120.0;

/// Grid state for one simulation: three double-buffered fields and the
/// constants fixed at construction.
///
/// The solver is an owned value; dropping it releases all grid storage.
/// Grid dimensions are fixed for the solver's lifetime.
pub struct FluidSolver {
    width: usize,
    height: usize,
    viscosity: f64,
    density_source: f64,
    diffusion: f64,
    time_step: f64,
    u: FieldPair,
    v: FieldPair,
    density: FieldPair,
}

impl FluidSolver {
    /// Allocate a solver with six zero-initialized grids sized
    /// `(width + 2) × (height + 2)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for zero dimensions or
    /// non-positive / non-finite constants. The checks match
    /// [`Simulation::validate`] so a validated record always constructs.
    pub fn new(
        width: u64,
        height: u64,
        viscosity: f64,
        density_source: f64,
        diffusion: f64,
        time_step: f64,
    ) -> Result<Self, ConfigError> {
        fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if !(v > 0.0) || !v.is_finite() {
                return Err(ConfigError::InvalidField {
                    field,
                    reason: format!("must be positive and finite, got {v}"),
                });
            }
            Ok(())
        }

        if width == 0 {
            return Err(ConfigError::InvalidField {
                field: "world.width",
                reason: "must be > 0".into(),
            });
        }
        if height == 0 {
            return Err(ConfigError::InvalidField {
                field: "world.height",
                reason: "must be > 0".into(),
            });
        }
        positive("fluid.viscosity", viscosity)?;
        positive("fluid.density", density_source)?;
        positive("fluid.diffusion", diffusion)?;
        positive("time_step", time_step)?;

        let width = width as usize;
        let height = height as usize;
        let wb = width + 2;
        let hb = height + 2;

        Ok(Self {
            width,
            height,
            viscosity,
            density_source,
            diffusion,
            time_step,
            u: FieldPair::new(wb, hb),
            v: FieldPair::new(wb, hb),
            density: FieldPair::new(wb, hb),
        })
    }

    /// Build a solver from a parsed [`Simulation`] record.
    pub fn from_simulation(sim: &Simulation) -> Result<Self, ConfigError> {
        Self::new(
            sim.world.width,
            sim.world.height,
            sim.fluid.viscosity,
            sim.fluid.density,
            sim.fluid.diffusion,
            sim.time_step,
        )
    }

    /// Interior width.
    pub fn width(&self) -> u64 {
        self.width as u64
    }

    /// Interior height.
    pub fn height(&self) -> u64 {
        self.height as u64
    }

    /// Bounded width, `width + 2`.
    pub fn width_bounds(&self) -> u64 {
        (self.width + 2) as u64
    }

    /// Bounded height, `height + 2`.
    pub fn height_bounds(&self) -> u64 {
        (self.height + 2) as u64
    }

    /// Advance the simulation one time step: velocity step first, then
    /// density step — density advection depends on the just-updated
    /// velocity field.
    pub fn tick(&mut self) {
        self.velocity_step();
        self.density_step();
    }

    /// Add the configured density amount to interior cell `(x, y)`
    /// (0-based interior coordinates).
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::OutOfBounds`] without mutating any state
    /// when the coordinates fall outside `[0, width) × [0, height)`.
    pub fn increase_density(&mut self, x: u64, y: u64) -> Result<(), SpatialError> {
        self.check_interior(x, y)?;
        *self
            .density
            .active_mut()
            .at_mut(x as usize + 1, y as usize + 1) += self.density_source;
        Ok(())
    }

    /// Override the velocity at interior cell `(x, y)`.
    ///
    /// A component supplied as exactly `0.0` leaves the existing value
    /// untouched, so a force can never explicitly zero a component.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::OutOfBounds`] for coordinates outside the
    /// interior and [`SpatialError::ForceTooStrong`] when either component
    /// exceeds [`MAX_FORCE_VELOCITY`] in magnitude. Neither case mutates
    /// any state.
    pub fn apply_force(&mut self, x: u64, y: u64, vx: f64, vy: f64) -> Result<(), SpatialError> {
        self.check_interior(x, y)?;
        if vx.abs() > MAX_FORCE_VELOCITY || vy.abs() > MAX_FORCE_VELOCITY {
            return Err(SpatialError::ForceTooStrong {
                vx,
                vy,
                cap: MAX_FORCE_VELOCITY,
            });
        }

        let (bx, by) = (x as usize + 1, y as usize + 1);
        if vx != 0.0 {
            *self.u.active_mut().at_mut(bx, by) = vx;
        }
        if vy != 0.0 {
            *self.v.active_mut().at_mut(bx, by) = vy;
        }
        Ok(())
    }

    /// Capture `{u, v, density}` for every bounded cell, row-major.
    pub fn snapshot(&self) -> Snapshot {
        let wb = self.width + 2;
        let hb = self.height + 2;
        let mut cells = Vec::with_capacity(wb * hb);
        for y in 0..hb {
            for x in 0..wb {
                cells.push(CellState {
                    x: x as u64,
                    y: y as u64,
                    d: self.density.active().at(x, y),
                    u: self.u.active().at(x, y),
                    v: self.v.active().at(x, y),
                });
            }
        }
        Snapshot::new(wb as u64, hb as u64, cells)
    }

    fn check_interior(&self, x: u64, y: u64) -> Result<(), SpatialError> {
        if x >= self.width as u64 || y >= self.height as u64 {
            return Err(SpatialError::OutOfBounds {
                x,
                y,
                width: self.width as u64,
                height: self.height as u64,
            });
        }
        Ok(())
    }

    fn velocity_step(&mut self) {
        let (w, h, dt) = (self.width, self.height, self.time_step);

        // Fold accumulated external forces (previous buffers) into the
        // active velocity fields.
        {
            let (active, prev) = self.u.split_mut();
            add_scaled(active, prev, dt);
        }
        {
            let (active, prev) = self.v.split_mut();
            add_scaled(active, prev, dt);
        }

        self.u.swap();
        {
            let (target, source) = self.u.split_mut();
            diffuse(Boundary::InvertX, target, source, self.viscosity, dt, w, h);
        }
        self.v.swap();
        {
            let (target, source) = self.v.split_mut();
            diffuse(Boundary::InvertY, target, source, self.viscosity, dt, w, h);
        }
        self.project_step();

        self.u.swap();
        self.v.swap();
        {
            let (dest, u_prev) = self.u.split_mut();
            let v_prev = self.v.prev();
            advect(Boundary::InvertX, dest, u_prev, u_prev, v_prev, dt, w, h);
        }
        {
            let (dest, v_prev) = self.v.split_mut();
            let u_prev = self.u.prev();
            advect(Boundary::InvertY, dest, v_prev, u_prev, v_prev, dt, w, h);
        }
        self.project_step();
    }

    fn density_step(&mut self) {
        let (w, h, dt) = (self.width, self.height, self.time_step);

        self.density.swap();
        {
            let (target, source) = self.density.split_mut();
            diffuse(Boundary::Mirror, target, source, self.diffusion, dt, w, h);
        }
        self.density.swap();
        {
            let (dest, source) = self.density.split_mut();
            advect(
                Boundary::Mirror,
                dest,
                source,
                self.u.active(),
                self.v.active(),
                dt,
                w,
                h,
            );
        }
    }

    /// Projection with the previous velocity buffers as pressure and
    /// divergence scratch, matching the buffer discipline of the step
    /// sequence (the swaps that follow treat them as consumed).
    fn project_step(&mut self) {
        let (w, h) = (self.width, self.height);
        let (u_active, u_prev) = self.u.split_both_mut();
        let (v_active, v_prev) = self.v.split_both_mut();
        project(u_active, v_active, u_prev, v_prev, w, h);
    }
}
