use crate::client::{ControlMode, ErrorId, State};

/// Number of error slots reported by the `state` endpoint
const MAX_ERRORS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct MotorConfig {
    pub is_gimbal: bool,
    /// Phase resistance in milliohm
    pub resistance: f64,
    /// Phase inductance in microhenry
    pub inductance: f64,
    /// Calibration current in milliampere
    pub calibration_current: f64,
    pub pole_pairs: u8,
}

/// Configuration that survives a reset once saved
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Config {
    pub can_id: u8,
    pub baud_rate: u16,
    pub calibrated: bool,
    pub motor: MotorConfig,
    pub pos_gain: f64,
    pub vel_gain: f64,
    pub vel_integrator_gain: f64,
    pub vel_limit: f64,
    pub cur_limit: f64,
}

impl Config {
    fn factory(can_id: u8) -> Self {
        Self {
            can_id,
            baud_rate: 1000,
            calibrated: false,
            motor: MotorConfig {
                is_gimbal: false,
                resistance: 0.0,
                inductance: 0.0,
                calibration_current: 5000.0,
                pole_pairs: 0,
            },
            pos_gain: 25.0,
            vel_gain: 1.0e-4,
            vel_integrator_gain: 1.0e-5,
            vel_limit: 300_000.0,
            cur_limit: 10.0,
        }
    }
}

/// Controller state of the simulated device. Setpoints are tracked instantly.
#[derive(Debug, Clone)]
pub(super) struct Model {
    pub state: State,
    pub mode: ControlMode,
    pub errors: Vec<ErrorId>,
    pub position: f64,
    pub velocity: f64,
    pub pos_setpoint: f64,
    pub vel_setpoint: f64,
    pub iq_setpoint: f64,
    pub iq_estimate: f64,
    pub vbus: f64,
    pub temperature: f64,
    pub config: Config,
    saved: Config,
}

impl Model {
    pub fn new(can_id: u8) -> Self {
        let config = Config::factory(can_id);
        Self {
            state: State::Idle,
            mode: ControlMode::Current,
            errors: vec![],
            position: 0.0,
            velocity: 0.0,
            pos_setpoint: 0.0,
            vel_setpoint: 0.0,
            iq_setpoint: 0.0,
            iq_estimate: 0.0,
            vbus: 12.0,
            temperature: 40.0,
            saved: config.clone(),
            config,
        }
    }

    fn raise(&mut self, error: ErrorId) {
        if self.errors.len() < MAX_ERRORS && !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    fn stop(&mut self) {
        self.state = State::Idle;
        self.velocity = 0.0;
        self.vel_setpoint = 0.0;
        self.iq_setpoint = 0.0;
        self.iq_estimate = 0.0;
    }

    /// Handle a `set_state` request. Invalid transitions leave the state unchanged and raise [`ErrorId::InvalidState`].
    pub fn request_state(&mut self, state: u8, mode: u8) -> Result<(), ErrorId> {
        let (state, mode) = match (State::from_repr(state), ControlMode::from_repr(mode)) {
            (Some(state), Some(mode)) => (state, mode),
            _ => {
                self.raise(ErrorId::InvalidState);
                return Err(ErrorId::InvalidState);
            }
        };

        match state {
            State::Idle => {
                self.stop();
                self.errors.clear();
            }
            State::Calibrate if self.state == State::Idle => {
                // Calibration finishes immediately with nominal motor parameters
                let motor = &mut self.config.motor;
                motor.resistance = 200.0;
                motor.inductance = 100.0;
                motor.pole_pairs = 7;
                self.config.calibrated = true;
                self.errors.clear();
            }
            State::ClosedLoopControl if self.config.calibrated => {
                if self.state != State::ClosedLoopControl {
                    // Hold the present position when entering closed loop
                    self.pos_setpoint = self.position;
                }
                self.state = State::ClosedLoopControl;
                self.mode = mode;
            }
            _ => {
                self.raise(ErrorId::InvalidState);
                return Err(ErrorId::InvalidState);
            }
        }

        Ok(())
    }

    pub fn estop(&mut self) {
        self.stop();
    }

    fn in_mode(&self, mode: ControlMode) -> bool {
        self.state == State::ClosedLoopControl && self.mode == mode
    }

    pub fn set_position(&mut self, position: f64, velocity_ff: f64, current_ff: f64) {
        self.pos_setpoint = position;
        self.vel_setpoint = velocity_ff;
        self.iq_setpoint = current_ff.clamp(-self.config.cur_limit, self.config.cur_limit);
        if self.in_mode(ControlMode::Position) {
            self.position = position;
            self.velocity = velocity_ff;
            self.iq_estimate = self.iq_setpoint;
        }
    }

    pub fn set_velocity(&mut self, velocity: f64, current_ff: f64) {
        self.vel_setpoint = velocity.clamp(-self.config.vel_limit, self.config.vel_limit);
        self.iq_setpoint = current_ff.clamp(-self.config.cur_limit, self.config.cur_limit);
        if self.in_mode(ControlMode::Velocity) {
            self.velocity = self.vel_setpoint;
            self.iq_estimate = self.iq_setpoint;
        }
    }

    pub fn set_current(&mut self, current: f64) {
        self.iq_setpoint = current.clamp(-self.config.cur_limit, self.config.cur_limit);
        if self.in_mode(ControlMode::Current) {
            self.iq_estimate = self.iq_setpoint;
        }
    }

    pub fn save(&mut self) {
        self.saved = self.config.clone();
    }

    /// Forget the saved configuration. Takes effect on the next reset.
    pub fn erase(&mut self) {
        self.saved = Config::factory(self.saved.can_id);
    }

    /// Reboot: runtime state is cleared and the saved configuration is restored.
    pub fn reset(&mut self) {
        let saved = self.saved.clone();
        *self = Self::new(saved.can_id);
        self.config = saved.clone();
        self.saved = saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_loop_requires_calibration() {
        let mut model = Model::new(1);
        assert_eq!(model.request_state(2, 2), Err(ErrorId::InvalidState));
        assert_eq!(model.state, State::Idle);
        assert_eq!(model.errors, vec![ErrorId::InvalidState]);

        model.request_state(1, 0).unwrap();
        assert!(model.config.calibrated);
        assert!(model.errors.is_empty());

        model.request_state(2, 2).unwrap();
        assert_eq!(model.state, State::ClosedLoopControl);
        assert_eq!(model.mode, ControlMode::Position);
    }

    #[test]
    fn errors_are_not_repeated() {
        let mut model = Model::new(1);
        for _ in 0..10 {
            let _ = model.request_state(9, 0);
        }
        assert_eq!(model.errors.len(), 1);
    }

    #[test]
    fn setpoints_respect_limits() {
        let mut model = Model::new(1);
        model.request_state(1, 0).unwrap();
        model.request_state(2, 1).unwrap();

        model.set_velocity(1.0e6, 0.0);
        assert_eq!(model.velocity, 300_000.0);

        model.estop();
        assert_eq!(model.state, State::Idle);
        assert_eq!(model.velocity, 0.0);
    }

    #[test]
    fn reset_restores_saved_config() {
        let mut model = Model::new(1);
        model.request_state(1, 0).unwrap();
        model.config.vel_limit = 1000.0;
        model.save();

        model.config.vel_limit = 2000.0;
        model.reset();
        assert_eq!(model.config.vel_limit, 1000.0);
        assert!(model.config.calibrated);

        model.erase();
        model.reset();
        assert_eq!(model.config, Config::factory(1));
    }
}
