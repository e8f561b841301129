//! Time stepping of the P-Willmore flow with conformal reparametrization.
//!
//! Each step advances the surface by one solve of the flow system, reparametrizes the new
//! surface conformally and recomputes the curvature fields on the reparametrized surface.
use crate::assembly::{AssemblyContext, AutodiffAssembler};
use crate::element::ElementTables;
use crate::field::{FieldId, FieldRegistry};
use crate::mesh::Mesh;
use crate::solver::{solve_nonlinear, DenseLuSolver, NonlinearReport, NonlinearSettings};
use crate::willmore::{
    check_surface_mesh, compute_diagnostics, ConformalKernel, ConformalSettings, CurvatureInitializer, EnergyDensity,
    FlowKernel, FlowScheme, SurfaceDiagnostics, WillmoreFields,
};
use eyre::eyre;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Time steps growing geometrically from an initial value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStepSchedule {
    pub initial: f64,
    /// Factor applied to the time step after every step.
    pub growth: f64,
}

impl Default for TimeStepSchedule {
    fn default() -> Self {
        Self {
            initial: 5e-5,
            growth: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WillmoreSettings {
    pub density: EnergyDensity,
    /// Orientation of the unit normal relative to `x_u × x_v`.
    pub normal_sign: f64,
    pub volume_constraint: bool,
    pub area_constraint: bool,
    /// Smoothing of `Y` when the curvature fields are initialized.
    pub delta: f64,
    pub scheme: FlowScheme,
    pub conformal: ConformalSettings,
    pub time_step: TimeStepSchedule,
    pub flow_solver: NonlinearSettings,
    pub init_solver: NonlinearSettings,
    pub conformal_solver: NonlinearSettings,
}

impl Default for WillmoreSettings {
    fn default() -> Self {
        Self {
            density: EnergyDensity::default(),
            normal_sign: -1.0,
            volume_constraint: true,
            area_constraint: true,
            delta: 0.0,
            scheme: FlowScheme::default(),
            conformal: ConformalSettings::default(),
            time_step: TimeStepSchedule::default(),
            flow_solver: NonlinearSettings::fixed_steps(15, 1e-10),
            init_solver: NonlinearSettings::fixed_steps(1, 1e-12),
            conformal_solver: NonlinearSettings::fixed_steps(1, 1e-10),
        }
    }
}

/// Outcome of a single time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step: usize,
    /// Time at the end of the step.
    pub time: f64,
    /// The time step that was taken.
    pub dt: f64,
    pub flow: NonlinearReport,
    pub diagnostics: SurfaceDiagnostics,
    /// Diagnostics relative to the reference values captured after setup.
    pub ratios: SurfaceDiagnostics,
}

/// The complete state of a Willmore simulation.
#[derive(Debug)]
pub struct SimulationState {
    mesh: Mesh,
    elements: ElementTables,
    fields: FieldRegistry,
    willmore: WillmoreFields,
    settings: WillmoreSettings,
    time: f64,
    dt: f64,
    step: usize,
    reference: Option<SurfaceDiagnostics>,
}

impl SimulationState {
    /// Registers the fields on a closed surface mesh and sets the initial conditions.
    ///
    /// The displacement and the multipliers start at zero, `Y = -2 x̂` and
    /// `W = -2 p 2^(p - 2) x̂` with `p` the last exponent of the energy density.
    pub fn new(mesh: Mesh, settings: WillmoreSettings) -> eyre::Result<Self> {
        check_surface_mesh(&mesh)?;
        let elements = ElementTables::new()?;
        let mut fields = FieldRegistry::new();
        let willmore = WillmoreFields::register(
            &mut fields,
            &mesh,
            settings.volume_constraint,
            settings.area_constraint,
        )?;

        let p = settings.density.exponents[2];
        let w_scale = -2.0 * p * 2f64.powf(p - 2.0);
        fields.initialize_with(&mesh, willmore.y, |x, k| -2.0 * x[k]);
        fields.initialize_with(&mesh, willmore.w, |x, k| w_scale * x[k]);

        let dt = settings.time_step.initial;
        Ok(Self {
            mesh,
            elements,
            fields,
            willmore,
            settings,
            time: 0.0,
            dt,
            step: 0,
            reference: None,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn willmore_fields(&self) -> &WillmoreFields {
        &self.willmore
    }

    pub fn settings(&self) -> &WillmoreSettings {
        &self.settings
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// The time step of the next step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The number of completed time steps.
    pub fn step_index(&self) -> usize {
        self.step
    }

    /// Diagnostics captured at the end of [`setup`](Self::setup).
    pub fn reference(&self) -> Option<&SurfaceDiagnostics> {
        self.reference.as_ref()
    }

    /// Conformally reparametrizes the initial surface, computes the initial curvature fields and
    /// captures the reference diagnostics.
    pub fn setup(&mut self) -> eyre::Result<SurfaceDiagnostics> {
        self.reparametrize()?;
        self.copy_to_old();
        self.initialize_curvature()?;

        let diagnostics = self.diagnostics()?;
        info!(
            "Reference surface {:.10e}, volume {:.10e}, energy {:.10e}",
            diagnostics.surface, diagnostics.volume, diagnostics.energy
        );
        self.reference = Some(diagnostics);
        Ok(diagnostics)
    }

    /// Advances the flow by one time step.
    pub fn step(&mut self) -> eyre::Result<StepReport> {
        let reference = self
            .reference
            .ok_or_else(|| eyre!("Simulation must be set up before stepping"))?;

        self.copy_to_old();
        let dt = self.dt;
        let kernel = FlowKernel::new(
            self.willmore,
            self.settings.density.clone(),
            self.settings.normal_sign,
            dt,
            self.settings.scheme,
        );
        let flow = solve_nonlinear(
            &AutodiffAssembler::new(kernel),
            DenseLuSolver,
            &self.mesh,
            &self.elements,
            &mut self.fields,
            self.time + dt,
            &self.settings.flow_solver,
        )?;
        self.time += dt;
        self.dt *= self.settings.time_step.growth;
        self.step += 1;

        self.reparametrize()?;
        self.copy_to_old();
        self.initialize_curvature()?;

        let diagnostics = self.diagnostics()?;
        let ratios = diagnostics.ratios(&reference);
        info!(
            "Step {} (t = {:.6e}): surface {:.10e} ({:.10}), volume {:.10e} ({:.10}), energy {:.10e} ({:.10})",
            self.step,
            self.time,
            diagnostics.surface,
            ratios.surface,
            diagnostics.volume,
            ratios.volume,
            diagnostics.energy,
            ratios.energy
        );
        Ok(StepReport {
            step: self.step,
            time: self.time,
            dt,
            flow,
            diagnostics,
            ratios,
        })
    }

    /// Runs `steps` time steps, setting up the simulation first if necessary.
    pub fn run(&mut self, steps: usize) -> eyre::Result<Vec<StepReport>> {
        if self.reference.is_none() {
            self.setup()?;
        }
        (0..steps).map(|_| self.step()).collect()
    }

    /// Surface area, enclosed volume and energy of the current surface.
    pub fn diagnostics(&self) -> eyre::Result<SurfaceDiagnostics> {
        let context = AssemblyContext {
            mesh: &self.mesh,
            elements: &self.elements,
            fields: &self.fields,
            time: self.time,
        };
        compute_diagnostics(&context, &self.willmore, &self.settings.density, self.settings.normal_sign)
    }

    fn all_fields(&self) -> Vec<FieldId> {
        self.willmore.all()
    }

    fn copy_to_old(&mut self) {
        let ids = self.all_fields();
        self.fields.copy_to_old(&ids);
    }

    /// `nDx ← Dx`, solve the conformal system, `Dx ← nDx`.
    fn reparametrize(&mut self) -> eyre::Result<NonlinearReport> {
        self.fields.copy_values(self.willmore.dx, self.willmore.ndx)?;
        let kernel = ConformalKernel::new(&self.mesh, self.willmore, self.settings.conformal);
        let report = solve_nonlinear(
            &AutodiffAssembler::new(kernel),
            DenseLuSolver,
            &self.mesh,
            &self.elements,
            &mut self.fields,
            self.time,
            &self.settings.conformal_solver,
        )?;
        self.fields.copy_values(self.willmore.ndx, self.willmore.dx)?;
        debug!("Conformal reparametrization: residual norm {:e}", report.residual_norm);
        Ok(report)
    }

    fn initialize_curvature(&mut self) -> eyre::Result<NonlinearReport> {
        let kernel = CurvatureInitializer::new(
            self.willmore,
            self.settings.density.clone(),
            self.settings.normal_sign,
            self.settings.delta,
        );
        let report = solve_nonlinear(
            &AutodiffAssembler::new(kernel),
            DenseLuSolver,
            &self.mesh,
            &self.elements,
            &mut self.fields,
            self.time,
            &self.settings.init_solver,
        )?;
        debug!("Curvature initialization: residual norm {:e}", report.residual_norm);
        Ok(report)
    }
}
