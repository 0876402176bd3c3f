//! Auto Mode
//!
//! Flies the stored mission. The [`MissionSequencer`] walks the command
//! list; this mode implements [`MissionExecutor`] to fly each NAV command
//! through a sub-mode.
//!
//! # Sub-modes
//!
//! - `TakeOff`: climb in place to the command altitude
//! - `Waypoint`: straight line to the command location (spline waypoints
//!   are flown the same way)
//! - `Land`: optional approach at the current altitude, then descend
//! - `Rtl`: the RTL sub-state machine
//! - `Circle`: fly to the circle edge, then orbit for the requested turns
//! - `NavGuided`: accept guided targets until the time limit expires
//! - `Loiter`: hold at the command location, unlimited or timed
//! - `PayloadPlace`: descend until touchdown or the descent limit, release,
//!   climb back
//!
//! On entry: requires a position estimate and a non-empty mission (unless
//! forced). Forced entry without either lands in place. Losing the position
//! estimate requests LAND unless already landing.

use nalgebra::{Vector2, Vector3};

use crate::mission::{
    CommandKind, CommandStartResult, MissionCommand, MissionEvent, MissionExecutor, MissionSequencer,
    MissionState,
};

use super::circle::CirclePath;
use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::event::VehicleEvent;
use super::guided::GuidedController;
use super::land::{LandController, LandDetector};
use super::reason::ModeReason;
use super::rtl::RtlSequence;
use super::traits::Mode;

/// Landing stage of the `Land` sub-mode
#[derive(Debug, Clone, PartialEq)]
pub enum AutoLand {
    /// Flying to the landing point at the current altitude
    Approach,
    /// Descending
    Descend(LandController),
}

/// Payload placement stage
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadPhase {
    /// Flying to the placement point
    Approach,
    /// Lowering the payload
    Descend(LandDetector),
    /// Climbing back after release
    Ascend,
    /// Holding after the climb
    Done,
}

/// Payload placement state
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadPlace {
    phase: PayloadPhase,
    start_alt: f32,
    max_descent: f32,
}

impl PayloadPlace {
    /// Current stage
    pub fn phase(&self) -> &PayloadPhase {
        &self.phase
    }

    fn descend_start(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.wp_nav.hold();
        self.start_alt = ctx.state.altitude();
        self.phase = PayloadPhase::Descend(LandDetector::new());
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        match &mut self.phase {
            PayloadPhase::Approach => {
                ctx.run_nav(0.0, 0.0);
                if ctx.wp_nav.reached_destination() {
                    self.descend_start(ctx);
                }
            }
            PayloadPhase::Descend(detector) => {
                let touchdown = detector.update(ctx.state, ctx.dt);
                let descended = self.start_alt - ctx.state.altitude();
                if touchdown || (self.max_descent > 0.0 && descended >= self.max_descent) {
                    log_info!("auto: payload released after {} m", descended);
                    let here = ctx.state.position_xy();
                    ctx.wp_nav.set_destination(Vector3::new(here.x, here.y, self.start_alt));
                    self.phase = PayloadPhase::Ascend;
                    ctx.run_nav(0.0, 0.0);
                } else {
                    ctx.run_nav_descend(-ctx.config.land.speed, 0.0);
                }
            }
            PayloadPhase::Ascend => {
                ctx.run_nav(0.0, 0.0);
                if ctx.wp_nav.reached_destination() {
                    self.phase = PayloadPhase::Done;
                }
            }
            PayloadPhase::Done => ctx.run_nav(0.0, 0.0),
        }
    }
}

/// AUTO sub-mode
#[derive(Debug, Clone, PartialEq)]
pub enum AutoSubMode {
    /// Climbing to the take-off altitude
    TakeOff,
    /// Flying to a waypoint
    Waypoint,
    /// Landing
    Land(AutoLand),
    /// Returning to launch
    Rtl(RtlSequence),
    /// Orbiting a point; `path` is set once the circle edge is reached
    Circle {
        center: Vector3<f32>,
        radius: f32,
        turns: f32,
        path: Option<CirclePath>,
    },
    /// Following guided targets
    NavGuided {
        controller: GuidedController,
        elapsed: f32,
        time_limit: f32,
    },
    /// Holding at a point; `elapsed` counts from arrival
    Loiter { elapsed: f32, time: Option<f32> },
    /// Placing a payload
    PayloadPlace(PayloadPlace),
}

impl AutoSubMode {
    /// Sub-mode name for logging
    pub fn name(&self) -> &'static str {
        match self {
            AutoSubMode::TakeOff => "TakeOff",
            AutoSubMode::Waypoint => "Waypoint",
            AutoSubMode::Land(_) => "Land",
            AutoSubMode::Rtl(_) => "Rtl",
            AutoSubMode::Circle { .. } => "Circle",
            AutoSubMode::NavGuided { .. } => "NavGuided",
            AutoSubMode::Loiter { .. } => "Loiter",
            AutoSubMode::PayloadPlace(_) => "PayloadPlace",
        }
    }
}

/// Resolve a command location; zero horizontal position means "here" and
/// zero altitude means "current altitude target"
fn command_location(ctx: &ModeContext<'_>, cmd: &MissionCommand) -> Vector3<f32> {
    let xy = if cmd.position.xy() == Vector2::zeros() {
        ctx.state.position_xy()
    } else {
        cmd.position.xy()
    };
    let z = if cmd.position.z == 0.0 {
        ctx.pos_z.target().position
    } else {
        cmd.position.z
    };
    Vector3::new(xy.x, xy.y, z)
}

/// NAV command execution
#[derive(Debug, Clone, PartialEq)]
struct AutoNav {
    sub_mode: AutoSubMode,
}

impl AutoNav {
    fn set_sub_mode(&mut self, ctx: &mut ModeContext<'_>, sub_mode: AutoSubMode) {
        log_info!("auto: {}", sub_mode.name());
        ctx.log_event(VehicleEvent::SubModeChanged {
            mode: ModeId::Auto,
            sub_mode: sub_mode.name(),
        });
        self.sub_mode = sub_mode;
    }

    fn takeoff_start(&mut self, ctx: &mut ModeContext<'_>, cmd: &MissionCommand) {
        let here = ctx.state.position_xy();
        let altitude = cmd.position.z.max(ctx.state.altitude());
        ctx.wp_nav.set_destination(Vector3::new(here.x, here.y, altitude));
        self.set_sub_mode(ctx, AutoSubMode::TakeOff);
    }

    fn wp_start(&mut self, ctx: &mut ModeContext<'_>, destination: Vector3<f32>) {
        ctx.wp_nav.set_destination(destination);
        self.set_sub_mode(ctx, AutoSubMode::Waypoint);
    }

    fn land_start(&mut self, ctx: &mut ModeContext<'_>, target: Option<Vector2<f32>>) {
        let sub_mode = match target {
            Some(target) if ctx.state.position_ok() => {
                ctx.wp_nav
                    .set_destination(Vector3::new(target.x, target.y, ctx.pos_z.target().position));
                AutoLand::Approach
            }
            _ => AutoLand::Descend(LandController::start(ctx)),
        };
        self.set_sub_mode(ctx, AutoSubMode::Land(sub_mode));
    }

    fn land_descend_start(&mut self, ctx: &mut ModeContext<'_>) {
        let land = LandController::start(ctx);
        self.set_sub_mode(ctx, AutoSubMode::Land(AutoLand::Descend(land)));
    }

    fn rtl_start(&mut self, ctx: &mut ModeContext<'_>) {
        let sequence = RtlSequence::start(ctx, ModeId::Auto);
        self.set_sub_mode(ctx, AutoSubMode::Rtl(sequence));
    }

    fn circle_start(&mut self, ctx: &mut ModeContext<'_>, center: Vector3<f32>, radius: f32, turns: f32) {
        let radius = if radius > 0.0 {
            radius
        } else {
            ctx.config.wpnav.circle_radius
        };
        let offset = ctx.state.position_xy() - center.xy();
        let direction = if offset.norm() > 0.0 {
            offset / offset.norm()
        } else {
            Vector2::new(1.0, 0.0)
        };
        let edge = center.xy() + direction * radius;
        ctx.wp_nav.set_destination(Vector3::new(edge.x, edge.y, center.z));
        self.set_sub_mode(
            ctx,
            AutoSubMode::Circle {
                center,
                radius,
                turns,
                path: None,
            },
        );
    }

    fn nav_guided_start(&mut self, ctx: &mut ModeContext<'_>, time_limit: f32) {
        let mut controller = GuidedController::new(ModeId::Auto);
        controller.start(ctx);
        self.set_sub_mode(
            ctx,
            AutoSubMode::NavGuided {
                controller,
                elapsed: 0.0,
                time_limit,
            },
        );
    }

    fn loiter_start(&mut self, ctx: &mut ModeContext<'_>, destination: Vector3<f32>, time: Option<f32>) {
        ctx.wp_nav.set_destination(destination);
        self.set_sub_mode(ctx, AutoSubMode::Loiter { elapsed: 0.0, time });
    }

    fn payload_place_start(&mut self, ctx: &mut ModeContext<'_>, cmd: &MissionCommand, max_descent: f32) {
        let mut place = PayloadPlace {
            phase: PayloadPhase::Approach,
            start_alt: ctx.state.altitude(),
            max_descent,
        };
        if cmd.position.xy() == Vector2::zeros() {
            place.descend_start(ctx);
        } else {
            let target = cmd.position.xy();
            ctx.wp_nav
                .set_destination(Vector3::new(target.x, target.y, ctx.pos_z.target().position));
        }
        self.set_sub_mode(ctx, AutoSubMode::PayloadPlace(place));
    }

    /// Returns true if the sub-mode copes with a lost position estimate
    fn tolerates_position_loss(&self) -> bool {
        matches!(self.sub_mode, AutoSubMode::Land(_) | AutoSubMode::Rtl(_))
    }

    fn run(&mut self, ctx: &mut ModeContext<'_>) {
        match &mut self.sub_mode {
            AutoSubMode::TakeOff | AutoSubMode::Waypoint => ctx.run_nav(0.0, 0.0),
            AutoSubMode::Land(AutoLand::Approach) => {
                ctx.run_nav(0.0, 0.0);
                if ctx.wp_nav.reached_destination() {
                    self.land_descend_start(ctx);
                }
            }
            AutoSubMode::Land(AutoLand::Descend(land)) => land.update(ctx),
            AutoSubMode::Rtl(sequence) => sequence.update(ctx),
            AutoSubMode::Circle {
                center, radius, path, ..
            } => match path {
                Some(path) => {
                    let (position, velocity) = path.update(ctx.dt);
                    ctx.wp_nav.set_position_target(position, velocity);
                    ctx.run_nav(0.0, path.angular_velocity());
                }
                None => {
                    ctx.run_nav(0.0, 0.0);
                    if ctx.wp_nav.reached_destination() {
                        *path = Some(CirclePath::around(
                            ctx.state,
                            center.xy(),
                            *radius,
                            ctx.config.wpnav.circle_rate,
                            ctx.wp_nav.accel(),
                        ));
                    }
                }
            },
            AutoSubMode::NavGuided {
                controller, elapsed, ..
            } => {
                *elapsed += ctx.dt;
                controller.update(ctx);
            }
            AutoSubMode::Loiter { elapsed, .. } => {
                ctx.run_nav(0.0, 0.0);
                if ctx.wp_nav.reached_destination() {
                    *elapsed += ctx.dt;
                }
            }
            AutoSubMode::PayloadPlace(place) => place.update(ctx),
        }
    }
}

impl MissionExecutor for AutoNav {
    fn start_command(&mut self, ctx: &mut ModeContext<'_>, cmd: &MissionCommand) -> CommandStartResult {
        match cmd.kind() {
            CommandKind::Takeoff => self.takeoff_start(ctx, cmd),
            CommandKind::Waypoint { .. } | CommandKind::SplineWaypoint { .. } => {
                let destination = command_location(ctx, cmd);
                self.wp_start(ctx, destination);
            }
            CommandKind::LoiterUnlimited => {
                let destination = command_location(ctx, cmd);
                self.loiter_start(ctx, destination, None);
            }
            CommandKind::LoiterTime { time } => {
                let destination = command_location(ctx, cmd);
                self.loiter_start(ctx, destination, Some(time));
            }
            CommandKind::LoiterTurns { turns, radius } => {
                let center = command_location(ctx, cmd);
                self.circle_start(ctx, center, radius, turns);
            }
            CommandKind::ReturnToLaunch => self.rtl_start(ctx),
            CommandKind::Land => {
                let target = cmd.position.xy();
                let target = if target == Vector2::zeros() { None } else { Some(target) };
                self.land_start(ctx, target);
            }
            CommandKind::GuidedEnable { enable, time_limit } => {
                if !enable {
                    return CommandStartResult::Complete;
                }
                self.nav_guided_start(ctx, time_limit);
            }
            CommandKind::PayloadPlace { max_descent } => self.payload_place_start(ctx, cmd, max_descent),
            CommandKind::ChangeSpeed { speed } => {
                ctx.wp_nav.set_speed(speed);
                return CommandStartResult::Complete;
            }
            CommandKind::Unsupported(_) => return CommandStartResult::Unsupported,
        }
        CommandStartResult::Accepted
    }

    fn verify_command(&mut self, ctx: &mut ModeContext<'_>, _cmd: &MissionCommand) -> bool {
        match &self.sub_mode {
            AutoSubMode::TakeOff | AutoSubMode::Waypoint => ctx.wp_nav.reached_destination(),
            AutoSubMode::Land(AutoLand::Approach) => false,
            AutoSubMode::Land(AutoLand::Descend(land)) => land.is_complete(),
            AutoSubMode::Rtl(sequence) => sequence.is_complete(ctx),
            AutoSubMode::Circle { turns, path, .. } => path.as_ref().is_some_and(|path| path.turns() >= *turns),
            AutoSubMode::NavGuided {
                elapsed, time_limit, ..
            } => *time_limit > 0.0 && *elapsed >= *time_limit,
            AutoSubMode::Loiter { elapsed, time } => time.is_some_and(|time| *elapsed >= time),
            AutoSubMode::PayloadPlace(place) => place.phase == PayloadPhase::Done,
        }
    }

    fn on_mission_complete(&mut self, ctx: &mut ModeContext<'_>) {
        if matches!(self.sub_mode, AutoSubMode::Land(_)) || !ctx.state.is_flying() {
            return;
        }
        log_info!("auto: mission complete, loitering");
        let here = Vector3::new(ctx.state.position.x, ctx.state.position.y, ctx.pos_z.target().position);
        self.loiter_start(ctx, here, None);
    }
}

/// Auto mode
#[derive(Debug, Clone, PartialEq)]
pub struct AutoMode {
    sequencer: MissionSequencer,
    nav: AutoNav,
    land_requested: bool,
}

impl Default for AutoMode {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoMode {
    /// Create auto mode
    pub fn new() -> Self {
        Self {
            sequencer: MissionSequencer::new(),
            nav: AutoNav {
                sub_mode: AutoSubMode::Loiter {
                    elapsed: 0.0,
                    time: None,
                },
            },
            land_requested: false,
        }
    }

    /// Active sub-mode
    pub fn sub_mode(&self) -> &AutoSubMode {
        &self.nav.sub_mode
    }

    /// Mission progress
    pub fn sequencer(&self) -> &MissionSequencer {
        &self.sequencer
    }

    /// Guided destination while executing NAV_GUIDED_ENABLE
    pub fn guided_set_destination(
        &mut self,
        ctx: &mut ModeContext<'_>,
        destination: Vector3<f32>,
    ) -> Result<(), ModeError> {
        match &mut self.nav.sub_mode {
            AutoSubMode::NavGuided { controller, .. } => controller.set_destination(ctx, destination),
            _ => Err(ModeError::WrongMode {
                expected: ModeId::Guided,
                actual: ModeId::Auto,
            }),
        }
    }

    /// Guided velocity while executing NAV_GUIDED_ENABLE
    pub fn guided_set_velocity(&mut self, ctx: &mut ModeContext<'_>, velocity: Vector3<f32>) -> Result<(), ModeError> {
        match &mut self.nav.sub_mode {
            AutoSubMode::NavGuided { controller, .. } => controller.set_velocity(ctx, velocity),
            _ => Err(ModeError::WrongMode {
                expected: ModeId::Guided,
                actual: ModeId::Auto,
            }),
        }
    }

    fn publish(ctx: &mut ModeContext<'_>, events: &[MissionEvent]) {
        for event in events {
            let event = match *event {
                MissionEvent::CurrentChanged(seq) => {
                    log_info!("auto: mission item {}", seq);
                    VehicleEvent::MissionCurrent(seq)
                }
                MissionEvent::ItemReached(seq) => {
                    log_info!("auto: reached item {}", seq);
                    VehicleEvent::MissionItemReached(seq)
                }
                MissionEvent::MissionComplete => {
                    log_info!("auto: mission complete");
                    VehicleEvent::MissionComplete
                }
            };
            ctx.log_event(event);
        }
    }
}

impl Mode for AutoMode {
    fn id(&self) -> ModeId {
        ModeId::Auto
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError> {
        if !ignore_checks {
            if !ctx.state.position_ok() {
                return Err(ModeError::PositionUnavailable { mode: ModeId::Auto });
            }
            if ctx.mission.is_empty() {
                return Err(ModeError::MissionEmpty);
            }
        }

        self.land_requested = false;
        ctx.init_controllers();

        if !ctx.state.position_ok() || ctx.mission.is_empty() {
            log_warn!("auto: no position or mission, landing");
            self.nav.land_start(ctx, None);
            return Ok(());
        }

        let events = self.sequencer.start(&mut self.nav, ctx);
        Self::publish(ctx, &events);
        if self.sequencer.state() == MissionState::Idle {
            // No NAV command in the mission
            ctx.log_event(VehicleEvent::MissionComplete);
            self.nav.on_mission_complete(ctx);
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        if !ctx.state.position_ok() && !self.nav.tolerates_position_loss() {
            if !self.land_requested {
                log_warn!("auto: position lost, landing");
                ctx.request_mode(ModeId::Land, ModeReason::EkfFailsafe);
                self.land_requested = true;
            }
            ctx.run_degraded_alt_hold(false);
            return;
        }
        if !ctx.state.armed {
            ctx.write_idle();
            return;
        }

        self.nav.run(ctx);
        if self.sequencer.state() == MissionState::Running {
            let events = self.sequencer.update(&mut self.nav, ctx);
            Self::publish(ctx, &events);
        }
    }

    fn exit(&mut self, _ctx: &mut ModeContext<'_>) {
        self.sequencer.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::MissionStorage;
    use crate::mode::FlightSystems;
    use crate::parameters::FlightConfig;

    fn systems_with(commands: &[MissionCommand]) -> FlightSystems {
        let mut mission = MissionStorage::new();
        for cmd in commands {
            mission.add_command(*cmd).unwrap();
        }
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.mission = mission;
        systems.state.armed = true;
        systems.state.position_valid = true;
        systems.state.ekf.origin_valid = true;
        systems.state.home = Some(Vector3::zeros());
        systems
    }

    /// Run AUTO with the vehicle tracking its targets exactly
    fn fly(systems: &mut FlightSystems, mode: &mut AutoMode, cycles: usize, until: impl Fn(&AutoMode) -> bool) {
        for _ in 0..cycles {
            {
                let mut ctx = systems.context(0.01);
                mode.update(&mut ctx);
            }
            let target = *systems.pos_z.target();
            systems.state.position = Vector3::new(
                systems.wp_nav.pos_target().x,
                systems.wp_nav.pos_target().y,
                target.position,
            );
            systems.state.velocity = Vector3::new(
                systems.wp_nav.vel_target().x,
                systems.wp_nav.vel_target().y,
                target.velocity,
            );
            systems.state.landed = false;
            if until(mode) {
                return;
            }
        }
    }

    #[test]
    fn test_auto_rejects_empty_mission() {
        let mut systems = systems_with(&[]);
        let mut mode = AutoMode::new();
        let mut ctx = systems.context(0.0);
        assert_eq!(mode.enter(&mut ctx, false), Err(ModeError::MissionEmpty));
    }

    #[test]
    fn test_auto_forced_empty_mission_lands() {
        let mut systems = systems_with(&[]);
        let mut mode = AutoMode::new();
        let mut ctx = systems.context(0.0);
        assert!(mode.enter(&mut ctx, true).is_ok());
        assert_eq!(mode.sub_mode().name(), "Land");
    }

    #[test]
    fn test_auto_starts_first_command() {
        let mut systems = systems_with(&[
            MissionCommand::takeoff(10.0),
            MissionCommand::waypoint(Vector3::new(20.0, 0.0, 10.0)),
        ]);
        let mut mode = AutoMode::new();
        {
            let mut ctx = systems.context(0.0);
            mode.enter(&mut ctx, false).unwrap();
        }
        assert_eq!(*mode.sub_mode(), AutoSubMode::TakeOff);
        assert_eq!(systems.wp_nav.destination(), Some(Vector3::new(0.0, 0.0, 10.0)));
        assert!(systems.events.iter().any(|event| *event == VehicleEvent::MissionCurrent(0)));
    }

    #[test]
    fn test_auto_takeoff_then_waypoint() {
        let mut systems = systems_with(&[
            MissionCommand::takeoff(5.0),
            MissionCommand::waypoint(Vector3::new(20.0, 0.0, 5.0)),
        ]);
        let mut mode = AutoMode::new();
        {
            let mut ctx = systems.context(0.0);
            mode.enter(&mut ctx, false).unwrap();
        }

        fly(&mut systems, &mut mode, 3000, |mode| *mode.sub_mode() == AutoSubMode::Waypoint);
        assert_eq!(*mode.sub_mode(), AutoSubMode::Waypoint);
        assert_eq!(mode.sequencer().current_nav_index(), 1);

        fly(&mut systems, &mut mode, 6000, |mode| {
            mode.sequencer().state() == MissionState::Completed
        });
        assert_eq!(mode.sequencer().state(), MissionState::Completed);
        assert!(matches!(mode.sub_mode(), AutoSubMode::Loiter { time: None, .. }));
        assert!(systems.events.iter().any(|event| *event == VehicleEvent::MissionComplete));
    }

    #[test]
    fn test_auto_land_approach_then_descend_is_reported() {
        let mut systems = systems_with(&[MissionCommand::land(10.0, 0.0)]);
        systems.state.landed = false;
        systems.state.position = Vector3::new(0.0, 0.0, 10.0);
        let mut mode = AutoMode::new();
        {
            let mut ctx = systems.context(0.0);
            mode.enter(&mut ctx, false).unwrap();
        }
        assert_eq!(*mode.sub_mode(), AutoSubMode::Land(AutoLand::Approach));

        fly(&mut systems, &mut mode, 4000, |mode| {
            matches!(mode.sub_mode(), AutoSubMode::Land(AutoLand::Descend(_)))
        });
        assert!(matches!(mode.sub_mode(), AutoSubMode::Land(AutoLand::Descend(_))));
        let land_entries = systems
            .events
            .iter()
            .filter(|event| {
                **event
                    == VehicleEvent::SubModeChanged {
                        mode: ModeId::Auto,
                        sub_mode: "Land",
                    }
            })
            .count();
        assert_eq!(land_entries, 2);
    }

    #[test]
    fn test_auto_requests_land_on_position_loss() {
        let mut systems = systems_with(&[MissionCommand::waypoint(Vector3::new(20.0, 0.0, 10.0))]);
        systems.state.landed = false;
        systems.state.position = Vector3::new(0.0, 0.0, 10.0);
        let mut mode = AutoMode::new();
        {
            let mut ctx = systems.context(0.0);
            mode.enter(&mut ctx, false).unwrap();
        }
        systems.state.position_valid = false;
        {
            let mut ctx = systems.context(0.01);
            mode.update(&mut ctx);
        }
        assert_eq!(systems.request.map(|request| request.mode), Some(ModeId::Land));
    }

    #[test]
    fn test_guided_targets_only_in_nav_guided() {
        let mut guided = MissionCommand::new(crate::mission::command::MAV_CMD_NAV_GUIDED_ENABLE, Vector3::zeros());
        guided.param1 = 1.0;
        let mut systems = systems_with(&[MissionCommand::waypoint(Vector3::new(20.0, 0.0, 10.0)), guided]);
        systems.state.landed = false;
        systems.state.position = Vector3::new(0.0, 0.0, 10.0);

        let mut mode = AutoMode::new();
        let mut ctx = systems.context(0.0);
        mode.enter(&mut ctx, false).unwrap();
        assert_eq!(
            mode.guided_set_destination(&mut ctx, Vector3::new(5.0, 5.0, 10.0)),
            Err(ModeError::WrongMode {
                expected: ModeId::Guided,
                actual: ModeId::Auto,
            })
        );

        let storage = ctx.mission;
        let result = mode.nav.start_command(&mut ctx, storage.get(1).unwrap());
        assert_eq!(result, CommandStartResult::Accepted);
        assert_eq!(mode.sub_mode().name(), "NavGuided");
        assert!(mode
            .guided_set_destination(&mut ctx, Vector3::new(5.0, 5.0, 10.0))
            .is_ok());
    }

    #[test]
    fn test_payload_place_releases_at_max_descent() {
        let mut place_cmd = MissionCommand::new(crate::mission::command::MAV_CMD_NAV_PAYLOAD_PLACE, Vector3::zeros());
        place_cmd.param1 = 2.0;
        let mut systems = systems_with(&[place_cmd]);
        systems.state.landed = false;
        systems.state.position = Vector3::new(0.0, 0.0, 10.0);

        let mut mode = AutoMode::new();
        {
            let mut ctx = systems.context(0.0);
            mode.enter(&mut ctx, false).unwrap();
        }
        fly(&mut systems, &mut mode, 3000, |mode| match mode.sub_mode() {
            AutoSubMode::PayloadPlace(place) => *place.phase() == PayloadPhase::Ascend,
            _ => false,
        });

        assert!(systems.state.position.z <= 8.5);
        assert_eq!(systems.wp_nav.destination().map(|dest| dest.z), Some(10.0));
    }
}
