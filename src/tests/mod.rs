mod guarded;
