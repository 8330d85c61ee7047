mod test_curve_basic;
mod test_domain_basic;
mod test_plane_basic;
