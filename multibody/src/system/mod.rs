use crate::{
    body::{Body, BodyId},
    joint::{Joint, JointModel},
    MultibodyErrors,
};
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Unordered collection of bodies and joints, validated and sorted by `build`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiBodyBuilder {
    pub bodies: Vec<Body>,
    pub joints: Vec<Joint>,
}

impl MultiBodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&mut self, body: Body) -> Result<(), MultibodyErrors> {
        if self.bodies.iter().any(|b| b.id == body.id) {
            return Err(MultibodyErrors::DuplicateBody(body.id));
        }
        self.bodies.push(body);
        Ok(())
    }

    pub fn add_joint(&mut self, joint: Joint) {
        self.joints.push(joint);
    }

    pub fn with_body(mut self, body: Body) -> Result<Self, MultibodyErrors> {
        self.add_body(body)?;
        Ok(self)
    }

    pub fn with_joint(mut self, joint: Joint) -> Self {
        self.add_joint(joint);
        self
    }

    /// Validates the tree and orders it so that every parent precedes its children.
    /// Joint `i` of the result moves body `i`.
    pub fn build(self) -> Result<MultiBody, MultibodyErrors> {
        let index: HashMap<BodyId, usize> = self
            .bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id, i))
            .collect();

        // inner joint of each body, by builder index
        let mut inner_joint: Vec<Option<usize>> = vec![None; self.bodies.len()];
        for (j, joint) in self.joints.iter().enumerate() {
            let outer = joint
                .connections
                .outer_body
                .ok_or_else(|| MultibodyErrors::JointMissingOuterBody(joint.name.clone()))?;
            let outer = *index
                .get(&outer)
                .ok_or(MultibodyErrors::BodyNotFound(outer))?;
            if let Some(inner) = joint.connections.inner_body {
                if !index.contains_key(&inner) {
                    return Err(MultibodyErrors::ParentNotFound(inner));
                }
            }
            if inner_joint[outer].is_some() {
                return Err(MultibodyErrors::InnerJointExists(
                    self.bodies[outer].name.clone(),
                ));
            }
            inner_joint[outer] = Some(j);
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.bodies.len()];
        let mut queue = VecDeque::new();
        for (b, joint) in inner_joint.iter().enumerate() {
            let j = joint
                .ok_or_else(|| MultibodyErrors::BodyMissingInnerJoint(self.bodies[b].name.clone()))?;
            match self.joints[j].connections.inner_body {
                Some(parent) => children[index[&parent]].push(b),
                None => queue.push_back(b),
            }
        }

        // breadth first from the roots gives a parent-before-child ordering
        let mut order = Vec::with_capacity(self.bodies.len());
        while let Some(b) = queue.pop_front() {
            order.push(b);
            queue.extend(children[b].iter().copied());
        }
        if order.len() != self.bodies.len() {
            let orphan = (0..self.bodies.len())
                .find(|b| !order.contains(b))
                .map(|b| self.bodies[b].name.clone())
                .unwrap_or_default();
            return Err(MultibodyErrors::Disconnected(orphan));
        }

        let mut sorted_index = vec![0; self.bodies.len()];
        for (new, &old) in order.iter().enumerate() {
            sorted_index[old] = new;
        }

        let mut bodies = Vec::with_capacity(order.len());
        let mut joints = Vec::with_capacity(order.len());
        let mut parents = Vec::with_capacity(order.len());
        let mut param_pos = Vec::with_capacity(order.len());
        let mut dof_pos = Vec::with_capacity(order.len());
        let mut nr_params = 0;
        let mut nr_dof = 0;
        for &old in &order {
            // inner joints were checked above
            let joint = self.joints[inner_joint[old].unwrap_or_default()].clone();
            parents.push(
                joint
                    .connections
                    .inner_body
                    .map(|parent| sorted_index[index[&parent]]),
            );
            param_pos.push(nr_params);
            dof_pos.push(nr_dof);
            nr_params += joint.model.nparams();
            nr_dof += joint.model.ndof();
            bodies.push(self.bodies[old].clone());
            joints.push(joint);
        }

        Ok(MultiBody {
            bodies,
            joints,
            parents,
            param_pos,
            dof_pos,
            nr_params,
            nr_dof,
        })
    }
}

/// Tree of bodies connected by joints, sorted parent-before-child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBody {
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    parents: Vec<Option<usize>>,
    param_pos: Vec<usize>,
    dof_pos: Vec<usize>,
    nr_params: usize,
    nr_dof: usize,
}

impl MultiBody {
    pub fn nr_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn nr_joints(&self) -> usize {
        self.joints.len()
    }

    pub fn nr_params(&self) -> usize {
        self.nr_params
    }

    pub fn nr_dof(&self) -> usize {
        self.nr_dof
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, index: usize) -> &Body {
        &self.bodies[index]
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> &Joint {
        &self.joints[index]
    }

    /// Index of the inner body of joint `index`, `None` for a joint attached to the world
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }

    /// Joint inner frame placement in the parent body (or world) frame
    pub fn ib_from_jif(&self, index: usize) -> &Isometry3<f64> {
        &self.joints[index].connections.ib_from_jif
    }

    /// Position of the first coordinate of joint `index` in the joint parameter vector
    pub fn param_pos(&self, index: usize) -> usize {
        self.param_pos[index]
    }

    pub fn dof_pos(&self, index: usize) -> usize {
        self.dof_pos[index]
    }

    pub fn body_index(&self, id: BodyId) -> Result<usize, MultibodyErrors> {
        self.bodies
            .iter()
            .position(|b| b.id == id)
            .ok_or(MultibodyErrors::BodyNotFound(id))
    }

    /// Joints between the world and body `index`, root first
    pub fn joint_path(&self, index: usize) -> Vec<usize> {
        let mut path = vec![index];
        let mut current = index;
        while let Some(parent) = self.parents[current] {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Splits a flat joint parameter slice into per-joint coordinates
    pub fn split_params<T: Copy>(&self, params: &[T]) -> Vec<Vec<T>> {
        self.joints
            .iter()
            .zip(&self.param_pos)
            .map(|(joint, &pos)| params[pos..pos + joint.model.nparams()].to_vec())
            .collect()
    }
}
