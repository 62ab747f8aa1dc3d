// Flat node array. Leaves hold a sphere index into the scene's sphere
// vector instead of a pointer, since that vector never resizes once built.

use crate::ray::{aabb_hit, sphere_hit, InvRay, Ray, TraceContext};
use crate::sphere::{Aabb, Sphere};

pub enum BvhNode {
    Leaf { sphere_idx: usize },
    Internal { left: u32, right: u32, aabb: Aabb },
}

// Root is always at index 0. Empty means every trace misses.
pub struct Bvh {
    nodes: Vec<BvhNode>,
}

impl Bvh {
    // Recursively splits along the longest AABB axis at the median element.
    pub fn build(spheres: &[Sphere]) -> Bvh {
        if spheres.is_empty() {
            return Bvh { nodes: Vec::new() };
        }

        let mut builder = Builder {
            spheres,
            nodes: Vec::with_capacity(2 * spheres.len() - 1),
        };

        let mut indices: Vec<usize> = (0..spheres.len()).collect();
        let root = builder.alloc();
        debug_assert_eq!(root, 0);
        builder.populate_internal(root, &mut indices, 0, spheres.len());

        Bvh {
            nodes: builder.nodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn traverse(&self, ctx: &mut TraceContext, spheres: &[Sphere], ray: &Ray, inv_ray: &InvRay) {
        if self.nodes.is_empty() {
            return;
        }
        self.traverse_node(ctx, spheres, ray, inv_ray, 0);
    }

    fn traverse_node(
        &self,
        ctx: &mut TraceContext,
        spheres: &[Sphere],
        ray: &Ray,
        inv_ray: &InvRay,
        node: u32,
    ) {
        match &self.nodes[node as usize] {
            BvhNode::Leaf { sphere_idx } => {
                if let Some(t) = sphere_hit(ray, &spheres[*sphere_idx]) {
                    if t > 0.0 && t < ctx.t {
                        ctx.sphere_idx = Some(*sphere_idx);
                        ctx.t = t;
                    }
                }
            }
            BvhNode::Internal { left, right, aabb } => {
                if !aabb_hit(inv_ray, aabb, ctx.t) {
                    return;
                }
                self.traverse_node(ctx, spheres, ray, inv_ray, *left);
                self.traverse_node(ctx, spheres, ray, inv_ray, *right);
            }
        }
    }
}

struct Builder<'a> {
    spheres: &'a [Sphere],
    nodes: Vec<BvhNode>,
}

impl<'a> Builder<'a> {
    fn alloc(&mut self) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(BvhNode::Internal {
            left: 0,
            right: 0,
            aabb: Aabb {
                min: crate::math::Vec3::ZERO,
                max: crate::math::Vec3::ZERO,
            },
        });
        id
    }

    fn leaf_aabb(&self, idx: usize) -> Aabb {
        self.spheres[idx].aabb()
    }

    fn populate_internal(&mut self, id: u32, indices: &mut [usize], start: usize, end: usize) {
        let count = end - start;

        if count == 1 {
            self.nodes[id as usize] = BvhNode::Leaf {
                sphere_idx: indices[start],
            };
            return;
        }

        let mut aabb = self.leaf_aabb(indices[start]);
        for &idx in &indices[start + 1..end] {
            aabb = aabb.union(self.leaf_aabb(idx));
        }

        let size = aabb.max - aabb.min;
        let mut axis = 0usize;
        let mut max_size = size.x;
        for (a, s) in [(1usize, size.y), (2usize, size.z)] {
            if s > max_size {
                axis = a;
                max_size = s;
            }
        }

        let key = |b: &Builder, idx: usize| b.leaf_aabb(idx).min[axis];

        let left = self.alloc();
        let right = self.alloc();

        if count == 2 {
            let (a, b) = (indices[start], indices[start + 1]);
            let (lo, hi) = if key(self, a) < key(self, b) {
                (a, b)
            } else {
                (b, a)
            };
            self.nodes[left as usize] = BvhNode::Leaf { sphere_idx: lo };
            self.nodes[right as usize] = BvhNode::Leaf { sphere_idx: hi };
        } else {
            indices[start..end].sort_by(|&a, &b| {
                self.leaf_aabb(a).min[axis]
                    .partial_cmp(&self.leaf_aabb(b).min[axis])
                    .unwrap()
            });

            let mid = start + count / 2;
            self.populate_internal(left, indices, start, mid);
            self.populate_internal(right, indices, mid, end);
        }

        self.nodes[id as usize] = BvhNode::Internal { left, right, aabb };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::rng::Rng;
    use crate::sphere::SphereData;

    fn make_spheres(n: usize, seed: u32) -> Vec<Sphere> {
        let mut rng = Rng::with_seed(seed);
        (0..n)
            .map(|_| {
                Sphere::new(SphereData {
                    pos: rng.next_vector() * 20.0,
                    radius: 0.1 + rng.next_f32() * 0.9,
                    material_id: 0,
                })
            })
            .collect()
    }

    fn exhaustive_hit(spheres: &[Sphere], ray: &Ray) -> Option<(usize, f32)> {
        spheres
            .iter()
            .enumerate()
            .filter_map(|(i, s)| sphere_hit(ray, s).filter(|t| *t > 0.0).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    #[test]
    fn every_sphere_is_reachable_through_exactly_one_leaf() {
        let spheres = make_spheres(37, 1);
        let bvh = Bvh::build(&spheres);

        let mut seen = vec![0u32; spheres.len()];
        fn walk(bvh: &Bvh, node: u32, seen: &mut [u32]) {
            match &bvh.nodes[node as usize] {
                BvhNode::Leaf { sphere_idx } => seen[*sphere_idx] += 1,
                BvhNode::Internal { left, right, .. } => {
                    walk(bvh, *left, seen);
                    walk(bvh, *right, seen);
                }
            }
        }
        walk(&bvh, 0, &mut seen);
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn internal_aabbs_contain_their_descendants() {
        let spheres = make_spheres(24, 2);
        let bvh = Bvh::build(&spheres);

        fn check(bvh: &Bvh, spheres: &[Sphere], node: u32) -> Aabb {
            match &bvh.nodes[node as usize] {
                BvhNode::Leaf { sphere_idx } => spheres[*sphere_idx].aabb(),
                BvhNode::Internal { left, right, aabb } => {
                    let l = check(bvh, spheres, *left);
                    let r = check(bvh, spheres, *right);
                    let eps = 1e-4;
                    assert!(aabb.min.x <= l.min.x + eps && aabb.min.x <= r.min.x + eps);
                    assert!(aabb.max.x >= l.max.x - eps && aabb.max.x >= r.max.x - eps);
                    *aabb
                }
            }
        }
        check(&bvh, &spheres, 0);
    }

    #[test]
    fn bvh_traversal_matches_exhaustive_scan() {
        let spheres = make_spheres(100, 3);
        let bvh = Bvh::build(&spheres);

        let mut rng = Rng::with_seed(999);
        for _ in 0..2000 {
            let ray = Ray {
                origin: rng.next_vector() * 30.0,
                dir: rng.next_unit(),
            };

            let expected = exhaustive_hit(&spheres, &ray);

            let mut ctx = TraceContext::new();
            let inv_ray = InvRay::new(&ray);
            bvh.traverse(&mut ctx, &spheres, &ray, &inv_ray);

            match expected {
                Some((idx, t)) => {
                    assert_eq!(ctx.sphere_idx, Some(idx));
                    assert!((ctx.t - t).abs() < 1e-3);
                }
                None => assert_eq!(ctx.sphere_idx, None),
            }
        }
    }

    #[test]
    fn empty_scene_has_no_nodes_and_never_hits() {
        let spheres: Vec<Sphere> = Vec::new();
        let bvh = Bvh::build(&spheres);
        assert!(bvh.is_empty());

        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::new(0.0, 1.0, 0.0),
        };
        let mut ctx = TraceContext::new();
        let inv_ray = InvRay::new(&ray);
        bvh.traverse(&mut ctx, &spheres, &ray, &inv_ray);
        assert_eq!(ctx.sphere_idx, None);
    }
}
