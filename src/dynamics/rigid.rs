use glam::{Mat4, Vec3};

use crate::{
    collision::ground::{ContactImpulse, ContactModel, GroundCollision},
    core::{rigidbody::RigidBody, types::RigidBodySettings},
    error::{ensure_positive, Result},
    utils::logging::report_divergence,
    world::Simulation,
};

/// A single rigid box falling under gravity onto a contact model.
pub struct RigidBodySimulator {
    body: RigidBody,
    contact: Box<dyn ContactModel>,
    settings: RigidBodySettings,
    last_contact: Option<ContactImpulse>,
    diverged: bool,
}

impl std::fmt::Debug for RigidBodySimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigidBodySimulator")
            .field("body", &self.body)
            .field("settings", &self.settings)
            .field("last_contact", &self.last_contact)
            .field("diverged", &self.diverged)
            .finish_non_exhaustive()
    }
}

impl RigidBodySimulator {
    /// Simulator colliding `body` with the ground plane.
    pub fn new(body: RigidBody, ground: GroundCollision, settings: RigidBodySettings) -> Result<Self> {
        Self::with_contact_model(body, Box::new(ground), settings)
    }

    pub fn with_contact_model(
        mut body: RigidBody,
        contact: Box<dyn ContactModel>,
        settings: RigidBodySettings,
    ) -> Result<Self> {
        ensure_positive("orthonormality_tolerance", settings.orthonormality_tolerance)?;
        body.orientation_integration = settings.orientation;
        body.reorthonormalize = settings.reorthonormalize;
        log::debug!(
            "rigid body simulator: mass {}, size {}, {:?} orientation update",
            body.mass(),
            body.size(),
            settings.orientation
        );
        Ok(Self {
            body,
            contact,
            settings,
            last_contact: None,
            diverged: false,
        })
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut RigidBody {
        &mut self.body
    }

    pub fn transform(&self) -> Mat4 {
        self.body.transform()
    }

    pub fn settings(&self) -> &RigidBodySettings {
        &self.settings
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.settings.gravity = gravity;
    }

    /// Swaps the contact strategy, e.g. to change restitution or friction.
    pub fn set_contact_model(&mut self, contact: Box<dyn ContactModel>) {
        self.contact = contact;
    }

    pub fn contact_model(&self) -> &dyn ContactModel {
        self.contact.as_ref()
    }

    /// Contact resolved during the most recent update, if any.
    pub fn last_contact(&self) -> Option<&ContactImpulse> {
        self.last_contact.as_ref()
    }
}

impl Simulation for RigidBodySimulator {
    fn update(&mut self, dt: f32) {
        let gravity = self.settings.gravity * self.body.mass();
        self.body.add_force(gravity, Vec3::ZERO);
        self.last_contact = self.contact.compute(&mut self.body);
        self.body.update(dt);

        let drift = self.body.orthonormality_error();
        let bad = !self.body.is_finite() || !(drift <= self.settings.orthonormality_tolerance);
        self.diverged = report_divergence(self.name(), self.diverged, bad, drift);
    }

    fn has_diverged(&self) -> bool {
        self.diverged
    }

    fn reset_divergence(&mut self) {
        self.diverged = false;
    }

    fn name(&self) -> &'static str {
        "rigid body"
    }
}
