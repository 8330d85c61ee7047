mod test_contours_basic;
