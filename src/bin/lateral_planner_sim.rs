//
// Closed-loop lateral planning simulation on a winding road.
//
// author Ryohei Sasaki (@rsasaki0109)
//
// A synthetic perception model reports the road ahead (with noise) in the
// vehicle frame, the planner solves once per model frame and the vehicle
// follows the first planned curvature.
//
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use gnuplot::{AxesCommon, Caption, Color, Figure};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lateral_planner::common::{t_idxs, Desire, CONTROL_N, DT_MDL, TRAJECTORY_SIZE};
use lateral_planner::messages::{CarControl, CarState, ControlsState, CycleInputs, ModelOutput, XYZTData};
use lateral_planner::utils::interp;
use lateral_planner::{LateralPlanner, PlannerConfig, ServiceHealth};

const ROAD_DS: f64 = 0.5;
const LANE_WIDTH: f64 = 3.6;

#[derive(Parser, Debug)]
#[command(name = "lateral_planner_sim", about = "Closed-loop lateral planner simulation")]
struct Cli {
    /// Planner configuration (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of planning cycles to run
    #[arg(long, default_value_t = 400)]
    cycles: usize,

    /// Constant vehicle speed [m/s]
    #[arg(long, default_value_t = 20.0)]
    speed: f64,

    /// Seed for the perception noise
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Force lane priority mode on
    #[arg(long)]
    lane_priority: bool,

    /// Save a plot of the driven path
    #[arg(long)]
    plot: bool,
}

/// Road centre line sampled every `ROAD_DS` metres
struct Road {
    xs: Vec<f64>,
    ys: Vec<f64>,
    headings: Vec<f64>,
}

impl Road {
    fn winding(length: f64) -> Road {
        let n = (length / ROAD_DS).ceil() as usize + 1;
        let mut road = Road {
            xs: Vec::with_capacity(n),
            ys: Vec::with_capacity(n),
            headings: Vec::with_capacity(n),
        };
        let (mut x, mut y, mut heading) = (0.0_f64, 0.0_f64, 0.0_f64);
        for i in 0..n {
            road.xs.push(x);
            road.ys.push(y);
            road.headings.push(heading);
            let s = i as f64 * ROAD_DS;
            // straight lead-in, then alternating bends
            let curvature = if s < 100.0 {
                0.0
            } else {
                0.006 * (2.0 * std::f64::consts::PI * (s - 100.0) / 600.0).sin()
            };
            heading += curvature * ROAD_DS;
            x += heading.cos() * ROAD_DS;
            y += heading.sin() * ROAD_DS;
        }
        road
    }

    fn len(&self) -> usize {
        self.xs.len()
    }

    /// Index of the road sample closest to `(x, y)`, searching ahead of `from`
    fn nearest(&self, x: f64, y: f64, from: usize) -> usize {
        let end = (from + 200).min(self.len());
        (from..end)
            .map(|i| (i, (self.xs[i] - x).powi(2) + (self.ys[i] - y).powi(2)))
            .fold((from, f64::INFINITY), |best, cand| if cand.1 < best.1 { cand } else { best })
            .0
    }
}

struct Vehicle {
    x: f64,
    y: f64,
    yaw: f64,
    curvature: f64,
}

impl Vehicle {
    fn update(&mut self, v: f64, curvature: f64, dt: f64) {
        self.curvature = curvature;
        self.yaw += v * curvature * dt;
        self.x += v * self.yaw.cos() * dt;
        self.y += v * self.yaw.sin() * dt;
    }

    /// `(x, y)` expressed in the vehicle frame
    fn to_local(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = (x - self.x, y - self.y);
        let (s, c) = self.yaw.sin_cos();
        (c * dx + s * dy, -s * dx + c * dy)
    }
}

fn pi2pi(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}

/// Perception frame: road ahead in the vehicle frame plus noisy lane lines
fn model_frame(road: &Road, vehicle: &Vehicle, idx: usize, v: f64, rng: &mut StdRng, noise: &Normal<f64>) -> ModelOutput {
    let t = t_idxs();
    let bias = noise.sample(rng);

    let mut position = XYZTData {
        t: t.to_vec(),
        z: vec![0.0; TRAJECTORY_SIZE],
        x_std: vec![0.5; TRAJECTORY_SIZE],
        y_std: vec![0.3; TRAJECTORY_SIZE],
        z_std: vec![0.5; TRAJECTORY_SIZE],
        ..XYZTData::default()
    };
    let mut orientation = XYZTData::default();
    for ti in t.iter() {
        let j = (idx + (v * ti / ROAD_DS).round() as usize).min(road.len() - 1);
        let (lx, ly) = vehicle.to_local(road.xs[j], road.ys[j]);
        position.x.push(lx);
        position.y.push(ly + bias + 0.2 * noise.sample(rng));
        orientation.z.push(pi2pi(road.headings[j] - vehicle.yaw));
    }

    let lane_lines = [-1.5, -0.5, 0.5, 1.5]
        .iter()
        .map(|k| {
            let offset = k * LANE_WIDTH + 0.5 * noise.sample(rng);
            XYZTData {
                x: position.x.clone(),
                y: position.y.iter().map(|y| y - bias + offset).collect(),
                z: vec![0.0; TRAJECTORY_SIZE],
                t: t.to_vec(),
                ..XYZTData::default()
            }
        })
        .collect();

    ModelOutput {
        position,
        orientation,
        lane_lines,
        lane_line_probs: vec![0.3, 0.9, 0.9, 0.3],
        lane_line_stds: vec![0.2, 0.1, 0.1, 0.2],
        desire_state: vec![0.0; Desire::KeepRight.index() + 1],
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = match &cli.config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    if cli.lane_priority {
        config.lane_priority_mode = true;
    }
    info!(car = %config.car_name, lane_priority = config.lane_priority_mode, "starting simulation");

    let v = cli.speed;
    let road = Road::winding(v * DT_MDL * cli.cycles as f64 + v * 12.0 + 50.0);
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let noise = Normal::new(0.0, 0.05)?;

    let mut planner = LateralPlanner::with_default_solver(&config)?;
    let grid = t_idxs();
    let mut vehicle = Vehicle {
        x: 0.0,
        y: 0.5,
        yaw: 0.0,
        curvature: 0.0,
    };
    let mut idx = 0;
    let mut trail_x = Vec::with_capacity(cli.cycles);
    let mut trail_y = Vec::with_capacity(cli.cycles);
    let mut max_offset: f64 = 0.0;
    let mut untrusted = 0;
    let mut last_plan = None;

    for cycle in 0..cli.cycles {
        idx = road.nearest(vehicle.x, vehicle.y, idx);
        let inputs = CycleInputs {
            mono_time: cycle as f64 * DT_MDL,
            car_state: CarState {
                v_ego: v,
                ..CarState::default()
            },
            controls_state: ControlsState {
                curvature: vehicle.curvature,
            },
            car_control: CarControl { lat_active: true },
            model: model_frame(&road, &vehicle, idx, v, &mut rng, &noise),
            health: ServiceHealth::all_valid(),
        };

        planner.update(&inputs);
        let msgs = planner.publish();
        let plan = &msgs.lateral_plan;
        if !plan.mpc_solution_valid {
            untrusted += 1;
        }

        let curvature = interp(DT_MDL, &grid[..CONTROL_N], &plan.curvatures);
        vehicle.update(v, curvature, DT_MDL);
        trail_x.push(vehicle.x);
        trail_y.push(vehicle.y);

        let (_, offset) = vehicle.to_local(road.xs[idx], road.ys[idx]);
        max_offset = max_offset.max(offset.abs());
        if cycle % 20 == 0 {
            info!(
                cycle,
                offset,
                curvature,
                solve_time = plan.solver_execution_time,
                trusted = plan.mpc_solution_valid,
                lane_lines = plan.use_lane_lines,
                "cycle"
            );
        }
        last_plan = Some(msgs);
    }

    info!(max_offset, untrusted, "simulation finished");
    if let Some(msgs) = &last_plan {
        println!("{}", serde_json::to_string_pretty(msgs)?);
    }

    if cli.plot {
        std::fs::create_dir_all("./img/lateral_planning")?;
        let end = road.nearest(vehicle.x, vehicle.y, idx) + 1;
        let mut fig = Figure::new();
        fig.axes2d()
            .set_title("Lateral planner simulation", &[])
            .set_x_label("x [m]", &[])
            .set_y_label("y [m]", &[])
            .set_aspect_ratio(gnuplot::Fix(1.0))
            .lines(&road.xs[..end], &road.ys[..end], &[Caption("Road"), Color("black")])
            .lines(&trail_x, &trail_y, &[Caption("Vehicle"), Color("blue")]);
        match fig.save_to_svg("./img/lateral_planning/lateral_planner_sim.svg", 800, 600) {
            Ok(_) => println!("Plot saved to ./img/lateral_planning/lateral_planner_sim.svg"),
            Err(e) => eprintln!("Failed to save SVG: {:?}", e),
        }
    }

    Ok(())
}
